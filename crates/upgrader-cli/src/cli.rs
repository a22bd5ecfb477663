//! Argument definitions for `upgrade-code`.

use std::path::PathBuf;

use clap::Parser;
use upgrader_config::LogFormat;

/// Upgrades module code using the rules declared in `.upgrade.yml` files.
#[derive(Parser, Debug)]
#[command(name = "upgrade-code", version)]
pub(crate) struct Cli {
    /// File or directory to upgrade; must lie inside the root directory.
    #[arg(value_name = "PATH")]
    pub(crate) path: PathBuf,
    /// Rule groups to apply: code, config, lang.
    #[arg(
        short = 'r',
        long = "rule",
        value_name = "RULE",
        value_delimiter = ',',
        default_values = ["code", "config"]
    )]
    pub(crate) rules: Vec<String>,
    /// Project root searched for `.upgrade.yml` definitions.
    #[arg(short = 'd', long, value_name = "DIR", default_value = ".")]
    pub(crate) root_dir: PathBuf,
    /// Writes the upgraded files back to disk.
    #[arg(short, long)]
    pub(crate) write: bool,
    /// Tracing filter directive for diagnostics on stderr.
    #[arg(long, value_name = "FILTER", default_value = "info")]
    pub(crate) log_filter: String,
    /// Diagnostic log format: compact or json.
    #[arg(long, value_name = "FORMAT", default_value_t = LogFormat::Compact)]
    pub(crate) log_format: LogFormat,
}
