//! Engine module: CLI, command lines, hashing, progress and line tools

pub mod arg_parser;
pub mod cli;
pub mod command;
pub mod hashing;
pub mod progress;
pub mod tools;

// Re-export commonly used functions
pub use arg_parser::Cli;
pub use cli::handle_run;
pub use command::Invocation;
pub use hashing::content_id;
pub use tools::{copy_lines_after, substitute_placeholders, take_lines};
