pub mod backends;
pub mod gate;
