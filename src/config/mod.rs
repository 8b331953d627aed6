#[cfg(feature = "cli")]
pub mod cli;
pub mod file;

#[cfg(feature = "cli")]
pub use cli::{Cli, Command};
pub use file::Settings;
