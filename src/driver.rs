//! Git merge driver registration
//!
//! Wires the merge driver into git: a `merge.pkgmerge` config section plus
//! an attributes line routing `package.json` through it.

use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

const DRIVER_SECTION: &str = "merge.pkgmerge";
const DRIVER_COMMAND: &str = "emx-pkgmerge driver %O %A %B %L %P";
const DRIVER_NAME: &str = "npm package.json merge driver";
const ATTRIBUTES_LINE: &str = "package.json\tmerge=pkgmerge";

/// Where the driver registration lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigScope {
    /// The repository containing the working directory
    Local,
    /// The user's global git configuration
    Global,
}

impl ConfigScope {
    /// Leading arguments of a `git config` invocation for this scope
    fn config_args(&self) -> &'static [&'static str] {
        match self {
            ConfigScope::Local => &["config"],
            ConfigScope::Global => &["config", "--global"],
        }
    }

    /// Lowercase name, e.g. for log output
    pub fn name(&self) -> &'static str {
        match self {
            ConfigScope::Local => "local",
            ConfigScope::Global => "global",
        }
    }
}

/// Errors from registering or removing the merge driver
#[derive(Debug)]
pub enum DriverError {
    /// A git command failed
    GitCommand {
        /// The full command string (for diagnostics)
        command: String,
        /// Stderr from git
        stderr: String,
        /// Process exit code, if available
        exit_code: Option<i32>,
    },
    /// An I/O error (spawning git, editing the attributes file)
    Io(std::io::Error),
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverError::GitCommand {
                command,
                stderr,
                exit_code,
            } => {
                write!(f, "`{}` failed", command)?;
                if let Some(code) = exit_code {
                    write!(f, " (exit {})", code)?;
                }
                if !stderr.is_empty() {
                    write!(f, ": {}", stderr)?;
                }
                Ok(())
            }
            DriverError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let DriverError::Io(e) = self {
            Some(e)
        } else {
            None
        }
    }
}

impl From<std::io::Error> for DriverError {
    fn from(e: std::io::Error) -> Self {
        DriverError::Io(e)
    }
}

/// Register the merge driver in the given scope and make sure the scope's
/// attributes file routes `package.json` through it.
pub fn enable(dir: &Path, scope: ConfigScope) -> Result<(), DriverError> {
    let driver_key = format!("{}.driver", DRIVER_SECTION);
    let name_key = format!("{}.name", DRIVER_SECTION);

    let mut args: Vec<&str> = scope.config_args().to_vec();
    args.extend([driver_key.as_str(), DRIVER_COMMAND]);
    git_cmd(dir, &args)?;

    let mut args: Vec<&str> = scope.config_args().to_vec();
    args.extend([name_key.as_str(), DRIVER_NAME]);
    git_cmd(dir, &args)?;

    debug!("Registered {} in {} git config", DRIVER_SECTION, scope.name());

    match locate_gitattributes(dir, scope)? {
        Some(path) => ensure_attributes_entry(&path),
        None => {
            warn!("No usable attributes file for this scope, skipping git attributes");
            Ok(())
        }
    }
}

/// Remove the merge driver registration from the given scope.
///
/// Removing a section that was never written counts as success. The
/// attributes line is left in place; git ignores entries naming an
/// unconfigured driver.
pub fn disable(dir: &Path, scope: ConfigScope) -> Result<(), DriverError> {
    let mut args: Vec<&str> = scope.config_args().to_vec();
    args.extend(["--remove-section", DRIVER_SECTION]);
    match git_cmd(dir, &args) {
        Ok(_) => Ok(()),
        // Already unset
        Err(DriverError::GitCommand { .. }) => Ok(()),
        Err(err) => Err(err),
    }
}

/// Run a git command in `dir` and return trimmed stdout.
fn git_cmd(dir: &Path, args: &[&str]) -> Result<String, DriverError> {
    let out = Command::new("git").args(args).current_dir(dir).output()?;
    if out.status.success() {
        Ok(String::from_utf8_lossy(&out.stdout).trim_end().to_owned())
    } else {
        Err(DriverError::GitCommand {
            command: format!("git {}", args.join(" ")),
            stderr: String::from_utf8_lossy(&out.stderr).trim().to_owned(),
            exit_code: out.status.code(),
        })
    }
}

/// Attributes file for the scope: the repository's `.gitattributes`, or the
/// global `core.attributesfile` (recorded at git's XDG default when unset).
fn locate_gitattributes(dir: &Path, scope: ConfigScope) -> Result<Option<PathBuf>, DriverError> {
    match scope {
        ConfigScope::Local => match git_cmd(dir, &["rev-parse", "--show-toplevel"]) {
            Ok(toplevel) => Ok(Some(PathBuf::from(toplevel).join(".gitattributes"))),
            Err(DriverError::GitCommand { .. }) => Ok(None),
            Err(err) => Err(err),
        },
        ConfigScope::Global => {
            match git_cmd(dir, &["config", "--global", "core.attributesfile"]) {
                Ok(configured) if !configured.is_empty() => Ok(Some(expand_user(&configured))),
                _ => {
                    let Some(default) = default_attributes_file() else {
                        return Ok(None);
                    };
                    git_cmd(
                        dir,
                        &[
                            "config",
                            "--global",
                            "core.attributesfile",
                            &default.to_string_lossy(),
                        ],
                    )?;
                    Ok(Some(default))
                }
            }
        }
    }
}

/// Append the attributes line unless an entry for this driver is already
/// present anywhere in the file.
fn ensure_attributes_entry(gitattributes: &Path) -> Result<(), DriverError> {
    if gitattributes.exists() {
        let existing = fs::read_to_string(gitattributes)?;
        if existing.contains("merge=pkgmerge") {
            return Ok(());
        }
    } else if let Some(parent) = gitattributes.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(gitattributes)?;
    // Leading newline in case the file does not end with one
    write!(file, "\n{}\n", ATTRIBUTES_LINE)?;
    debug!("Attributes entry written to {}", gitattributes.display());
    Ok(())
}

/// Git's default global attributes path when `core.attributesfile` is unset.
fn default_attributes_file() -> Option<PathBuf> {
    if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        if !xdg.is_empty() {
            return Some(PathBuf::from(xdg).join("git").join("attributes"));
        }
    }
    env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("git")
            .join("attributes")
    })
}

fn expand_user(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}
