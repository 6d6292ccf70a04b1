pub mod cli;
pub mod commands;
pub mod config;

pub use cli::Cli;
pub use commands::App;
pub use commands::CommandError;
pub use commands::Output;
