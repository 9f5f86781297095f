mod backend;
mod conversation;
mod error;
mod event;
mod execution;
mod fragment;
mod generation;
mod kind;
mod loading;
mod message;
mod notice;
mod preview;
mod role;
mod session;
mod slash_commands;

pub use backend::*;
pub use conversation::*;
pub use error::*;
pub use event::*;
pub use execution::*;
pub use fragment::*;
pub use generation::*;
pub use kind::*;
pub use loading::*;
pub use message::*;
pub use notice::*;
pub use preview::*;
pub use role::*;
pub use session::*;
pub use slash_commands::*;
