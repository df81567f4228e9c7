//! Result dispatch
//!
//! Once the walk is finished the matched paths are either printed, one per
//! line, or handed as arguments to an external command that replaces the
//! current process.

use std::ffi::{OsStr, OsString};
use std::io::{self, BufWriter, Write};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

use crate::errors::{FindError, FindResult};

/// How matched paths are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathFormat {
    /// The root as given, followed by the relative path
    #[default]
    Joined,
    /// The path relative to the root
    Relative,
    /// The canonical root followed by the relative path
    Absolute,
}

/// Render root-relative matches according to `format`
pub fn format_paths(root: &Path, matches: &[PathBuf], format: PathFormat) -> FindResult<Vec<PathBuf>> {
    let base = match format {
        PathFormat::Relative => return Ok(matches.to_vec()),
        PathFormat::Joined => root.to_path_buf(),
        PathFormat::Absolute => root
            .canonicalize()
            .map_err(|_| FindError::InvalidPath(root.to_path_buf()))?,
    };

    Ok(matches.iter().map(|path| base.join(path)).collect())
}

/// Write each path followed by a newline, byte for byte
pub fn print_paths<W: Write>(out: W, paths: &[PathBuf]) -> io::Result<()> {
    let mut out = BufWriter::new(out);
    for path in paths {
        out.write_all(path.as_os_str().as_bytes())?;
        out.write_all(b"\n")?;
    }
    out.flush()
}

/// What to do with the matched paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Print to stdout
    Print,
    /// Replace the process with this command, matches appended as arguments
    Exec(OsString),
}

impl Dispatch {
    pub fn from_command(command: Option<&OsStr>) -> Self {
        match command {
            Some(command) => Dispatch::Exec(command.to_os_string()),
            None => Dispatch::Print,
        }
    }

    /// Deliver the paths.
    ///
    /// `Exec` only returns when the command could not be started; with no
    /// matches the command still runs, with no extra arguments.
    pub fn run(&self, paths: &[PathBuf]) -> FindResult<()> {
        match self {
            Dispatch::Print => {
                print_paths(io::stdout().lock(), paths)?;
                Ok(())
            }
            Dispatch::Exec(command) => {
                debug!(
                    "Executing {} with {} arguments",
                    command.to_string_lossy(),
                    paths.len()
                );
                let source = Command::new(command).args(paths).exec();
                Err(FindError::Exec {
                    command: command.to_string_lossy().into_owned(),
                    source,
                })
            }
        }
    }
}
