//! Command line flags and TOML settings. The file defaults to
//! `settings/dev.toml` in debug builds and `settings/release.toml` otherwise.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
