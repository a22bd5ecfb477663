//! Upgrade definitions for `upgrade-code`.
//!
//! Every module that ships upgrade rules carries a `.upgrade.yml` file next
//! to its sources. This crate finds those files under a project root,
//! merges them into one [`UpgradeConfig`] and turns a rule selection into an
//! [`upgrader_core::UpgradeSpec`]. It also owns the [`LogFormat`] shared by
//! the command-line front end.

mod definition;
mod error;
mod loader;
mod logging;

pub use definition::{Definition, RawApiChange, RawMethodWarning, RawWarnings};
pub use error::ConfigError;
pub use loader::{DEFINITION_FILE, MAX_DISCOVERY_DEPTH, UpgradeConfig, discover};
pub use logging::{LogFormat, LogFormatParseError};
