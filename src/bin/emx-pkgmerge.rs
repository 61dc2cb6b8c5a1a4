//! emx-pkgmerge CLI
//!
//! Detect the formatting of JSON files and three-way merge package.json
//! files, either directly or as a git merge driver.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use emx_pkgmerge::driver;
use emx_pkgmerge::{
    detect_file, detect_first, merge, Conflict, ConfigScope, ConflictResolution, MergeOptions,
    StyleWriter,
};

#[derive(Parser, Debug)]
#[command(name = "emx-pkgmerge")]
#[command(author = "nzinfo <li.monan@gmail.com>")]
#[command(version)]
#[command(about = "Format-preserving three-way merge for package.json")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report the dominant indentation and newline of a file
    Detect {
        /// File to inspect
        file: PathBuf,
    },

    /// Merge local and remote package.json files against a common base
    Merge {
        /// Common ancestor version
        base: PathBuf,

        /// Local version
        local: PathBuf,

        /// Remote version
        remote: PathBuf,

        /// Write the merge result to this file, keeping the inputs'
        /// formatting (default: compact JSON on stdout)
        #[arg(short = 'o', long)]
        out: Option<PathBuf>,

        /// Log the recorded conflicts instead of writing the merge result
        #[arg(long)]
        decisions: bool,

        /// How to resolve fields both sides changed differently
        #[arg(long, value_enum, default_value_t = ResolutionArg::KeepLocal)]
        resolution: ResolutionArg,

        /// Keep competing root "version" fields as a conflict instead of
        /// taking the higher version
        #[arg(long)]
        no_version_take_max: bool,
    },

    /// Run as a git merge driver: merge in place and exit 1 on conflicts
    ///
    /// Git invokes this with its %O %A %B %L %P placeholders once the
    /// driver is registered via `config enable`.
    Driver {
        /// Ancestor version of the file (%O)
        base: PathBuf,

        /// Current version of the file (%A); rewritten with the result
        local: PathBuf,

        /// Other branch's version of the file (%B)
        remote: PathBuf,

        /// Conflict marker size (%L)
        marker_size: u32,

        /// Pathname of the file being merged (%P)
        pathname: Option<String>,
    },

    /// Register or unregister the merge driver with git
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Add the driver to git config and map package.json to it in
    /// the gitattributes file
    Enable {
        /// Use the global git configuration instead of the repository's
        #[arg(long)]
        global: bool,
    },

    /// Remove the driver from git config
    Disable {
        /// Use the global git configuration instead of the repository's
        #[arg(long)]
        global: bool,
    },
}

/// Conflict resolutions exposed on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ResolutionArg {
    /// Keep the local value and report the conflict
    KeepLocal,
    /// Take the base value
    UseBase,
    /// Take the local value
    UseLocal,
    /// Take the remote value
    UseRemote,
    /// Concatenate arrays from both sides, dropping duplicates
    Union,
}

impl From<ResolutionArg> for ConflictResolution {
    fn from(arg: ResolutionArg) -> Self {
        match arg {
            ResolutionArg::KeepLocal => ConflictResolution::KeepLocal,
            ResolutionArg::UseBase => ConflictResolution::UseBase,
            ResolutionArg::UseLocal => ConflictResolution::UseLocal,
            ResolutionArg::UseRemote => ConflictResolution::UseRemote,
            ResolutionArg::Union => ConflictResolution::Union,
        }
    }
}

impl std::fmt::Display for ResolutionArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let v = match self {
            Self::KeepLocal => "keep-local",
            Self::UseBase => "use-base",
            Self::UseLocal => "use-local",
            Self::UseRemote => "use-remote",
            Self::Union => "union",
        };
        write!(f, "{v}")
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Detect { file } => {
            detect_command(&file)?;
        }
        Commands::Merge {
            base,
            local,
            remote,
            out,
            decisions,
            resolution,
            no_version_take_max,
        } => {
            let options = MergeOptions {
                resolution: resolution.into(),
                version_take_max: !no_version_take_max,
            };
            run_merge(&base, &local, &remote, out.as_deref(), decisions, &options)?;
        }
        Commands::Driver {
            base,
            local,
            remote,
            // TODO: pass the marker size through to conflict markers once
            // the merged output can carry them
            marker_size: _,
            pathname,
        } => {
            if let Some(pathname) = &pathname {
                debug!("Running as merge driver for {}", pathname);
            }
            run_merge(
                &base,
                &local,
                &remote,
                Some(local.as_path()),
                false,
                &MergeOptions::default(),
            )?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Enable { global } => {
                let scope = config_scope(global);
                driver::enable(&current_dir()?, scope)?;
                info!("Merge driver enabled in the {} git config", scope.name());
            }
            ConfigAction::Disable { global } => {
                let scope = config_scope(global);
                driver::disable(&current_dir()?, scope)?;
                info!("Merge driver removed from the {} git config", scope.name());
            }
        },
    }

    Ok(())
}

fn detect_command(file: &Path) -> Result<()> {
    let style = detect_file(file)?;

    match style.kind {
        Some(kind) => println!("indent: {} x {}", kind.name(), style.amount),
        None => println!("indent: none"),
    }
    match style.newline {
        Some(newline) => println!("newline: {}", newline.name()),
        None => println!("newline: none"),
    }

    Ok(())
}

fn run_merge(
    base: &Path,
    local: &Path,
    remote: &Path,
    out: Option<&Path>,
    decisions: bool,
    options: &MergeOptions,
) -> Result<()> {
    let base_doc = load_document(base)?;
    let local_doc = load_document(local)?;
    let remote_doc = load_document(remote)?;

    // Deletion on both sides agrees; there is nothing left to merge
    if local_doc.is_none() && remote_doc.is_none() {
        if decisions {
            info!("Both sides deleted the document");
        } else if let Some(out) = out {
            if out.exists() {
                fs::remove_file(out)
                    .with_context(|| format!("Failed to delete {}", out.display()))?;
                info!("Deleted {}", out.display());
            }
        }
        return Ok(());
    }

    let style = detect_first([base, local, remote]);

    let empty = Value::Object(serde_json::Map::new());
    let base_doc = base_doc.unwrap_or_else(|| empty.clone());
    let local_doc = local_doc.unwrap_or_else(|| empty.clone());
    let remote_doc = remote_doc.unwrap_or(empty);

    let outcome = merge(&base_doc, &local_doc, &remote_doc, options);

    if outcome.is_clean() {
        debug!("Merge completed with no unresolved conflicts");
    } else {
        warn!("Merge left {} unresolved conflict(s)", outcome.conflicts.len());
    }

    if decisions {
        report_conflicts(&outcome.conflicts);
    } else if let Some(out) = out {
        let writer = StyleWriter::new(style);
        writer
            .serialize_to_file(&outcome.merged, out)
            .with_context(|| format!("Failed to write {}", out.display()))?;
        info!("Merge result written to {}", out.display());
    } else {
        println!("{}", serde_json::to_string(&outcome.merged)?);
    }

    if !outcome.is_clean() {
        std::process::exit(1);
    }
    Ok(())
}

/// Read one merge input. A missing or empty file stands for "no document
/// on this side"; git hands the driver an empty base when the branches
/// share no ancestor for the file.
fn load_document(path: &Path) -> Result<Option<Value>> {
    if !path.exists() {
        warn!("Treating missing {} as an absent document", path.display());
        return Ok(None);
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if text.trim().is_empty() {
        return Ok(None);
    }
    let value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(value))
}

fn report_conflicts(conflicts: &[Conflict]) {
    if conflicts.is_empty() {
        info!("No conflicts recorded");
        return;
    }
    for conflict in conflicts {
        info!(
            "Conflict at {}: base {}, local {}, remote {}",
            conflict.path,
            describe(conflict.base.as_ref()),
            describe(conflict.local.as_ref()),
            describe(conflict.remote.as_ref()),
        );
    }
}

fn describe(value: Option<&Value>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "<absent>".to_string(),
    }
}

fn config_scope(global: bool) -> ConfigScope {
    if global {
        ConfigScope::Global
    } else {
        ConfigScope::Local
    }
}

fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().context("Failed to resolve the current directory")
}
