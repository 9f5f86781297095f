mod classifier;
mod conversation_state;
mod generations;
mod synthesizer;

pub use classifier::*;
pub use conversation_state::*;
pub use generations::*;
pub use synthesizer::*;
