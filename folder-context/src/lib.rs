pub mod cli;
pub mod clipboard;
pub mod load_config;
pub mod report;
pub mod shell;

pub use cli::{run, Cli, Commands};
