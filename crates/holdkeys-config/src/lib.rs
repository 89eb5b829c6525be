//! Configuration parsing for holdkeys
//!
//! This crate handles parsing KDL configuration files and inline `--hotkey`
//! arguments, and owns the key/button symbol tables shared by the daemon
//! and the CLI.

mod error;
pub mod keys;
mod model;
mod parser;

pub use error::ConfigError;
pub use model::*;
pub use parser::{parse_config, parse_config_str, parse_hotkey_spec};
