pub mod cli;
pub mod render;
pub mod repl;
pub mod server;
