//! Command-line runtime for `upgrade-code`.
//!
//! A run loads the `.upgrade.yml` definitions under the root directory,
//! builds the selected rule groups, upgrades every file below `PATH` and
//! prints the resulting diffs and warnings. Files are only written back when
//! `--write` is given. The runtime takes its output streams as parameters so
//! tests can capture them.

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use upgrader_config::UpgradeConfig;
use upgrader_core::{CodeCollection, Upgrader};

mod cli;
mod collection;
mod display;
mod errors;
mod telemetry;

use cli::Cli;
use collection::DiskCollection;
use errors::AppError;

const UNSAVED_HINT: &str = "Changes not saved; run with --write to commit to disk";

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let rendered = error.render().to_string();
            if error.use_stderr() {
                let _ = write!(stderr, "{rendered}");
                return ExitCode::from(2);
            }
            let _ = write!(stdout, "{rendered}");
            return ExitCode::SUCCESS;
        }
    };

    match execute(&cli, stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

fn execute<W: Write>(cli: &Cli, stdout: &mut W) -> Result<(), AppError> {
    telemetry::initialise(&cli.log_filter, cli.log_format)?;
    let (root, target) = resolve_paths(&cli.root_dir, &cli.path)?;

    let config = UpgradeConfig::load(&root)?;
    let upgrader = Upgrader::new(config.spec(&cli.rules)?)?;
    let mut collection = DiskCollection::new(root, target, config.excluded_paths())?;

    let files = collection.files()?;
    let changes = upgrader.upgrade(&files)?;
    display::render_changes(&changes, stdout).map_err(AppError::Report)?;

    if cli.write {
        let written = collection.apply(&changes)?;
        info!(written, "saved upgraded files");
        writeln!(stdout, "Wrote {written} files").map_err(AppError::Report)?;
    } else {
        writeln!(stdout, "{UNSAVED_HINT}").map_err(AppError::Report)?;
    }
    Ok(())
}

/// Canonicalises both paths and checks that `path` lies strictly inside
/// `root_dir`.
fn resolve_paths(root_dir: &Path, path: &Path) -> Result<(PathBuf, PathBuf), AppError> {
    let canonical = |candidate: &Path| {
        fs::canonicalize(candidate).map_err(|source| AppError::ResolvePath {
            path: candidate.to_path_buf(),
            source,
        })
    };
    let root = canonical(root_dir)?;
    let target = canonical(path)?;
    if target == root || !target.starts_with(&root) {
        return Err(AppError::OutsideRoot { path: target, root });
    }
    Ok((root, target))
}

#[cfg(test)]
mod tests;
