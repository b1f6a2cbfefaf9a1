//! Configuration: command-line flags, an optional TOML file, and the
//! validated [`SyncConfig`] built from them once at startup.
//!
//! Flags win over file values. Without `--config`, the file at
//! `<config dir>/dirmirror/config.toml` is read when it exists.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;

use crate::error::SyncError;
use crate::hash::HashAlgorithm;

/// Keep a replica directory identical to a source directory.
#[derive(Debug, Parser)]
#[command(name = "dirmirror")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory whose content is authoritative
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Directory kept identical to the source
    #[arg(short, long)]
    pub replica: Option<PathBuf>,

    /// File every synchronisation step is appended to
    #[arg(short, long)]
    pub log_file: Option<PathBuf>,

    /// Seconds between synchronisations
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Fingerprint algorithm (md5, sha256, blake3)
    #[arg(long)]
    pub hash: Option<HashAlgorithm>,

    /// Log what would change without touching the replica
    #[arg(long)]
    pub dry_run: bool,

    /// Run a single synchronisation and exit
    #[arg(long)]
    pub once: bool,

    /// Enable debug diagnostics on stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// TOML file providing defaults for the options above
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// On-disk configuration. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub source: Option<PathBuf>,
    pub replica: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub interval: Option<u64>,
    pub hash: Option<String>,
    pub dry_run: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// `<config dir>/dirmirror/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("dirmirror").join("config.toml"))
    }
}

/// Everything one mirroring process needs, fixed for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub source: PathBuf,
    pub replica: PathBuf,
    pub log_file: PathBuf,
    pub interval: Duration,
    pub algorithm: HashAlgorithm,
    pub dry_run: bool,
}

impl SyncConfig {
    pub fn new(
        source: impl Into<PathBuf>,
        replica: impl Into<PathBuf>,
        log_file: impl Into<PathBuf>,
        interval: Duration,
    ) -> Self {
        Self {
            source: source.into(),
            replica: replica.into(),
            log_file: log_file.into(),
            interval,
            algorithm: HashAlgorithm::default(),
            dry_run: false,
        }
    }

    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Merge flags over file values and validate the result.
    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self, SyncError> {
        let source = required(cli.source.clone().or(file.source), "source")?;
        let replica = required(cli.replica.clone().or(file.replica), "replica")?;
        let log_file = required(cli.log_file.clone().or(file.log_file), "log-file")?;
        let interval = required(cli.interval.or(file.interval), "interval")?;

        if interval == 0 {
            return Err(SyncError::InvalidConfig {
                message: "interval must be a positive number of seconds".to_string(),
            });
        }
        if same_directory(&source, &replica) {
            return Err(SyncError::InvalidConfig {
                message: format!("source and replica are the same directory: {}", source.display()),
            });
        }

        let algorithm = match (cli.hash, file.hash) {
            (Some(algorithm), _) => algorithm,
            (None, Some(name)) => name.parse()?,
            (None, None) => HashAlgorithm::default(),
        };

        Ok(Self {
            source,
            replica,
            log_file,
            interval: Duration::from_secs(interval),
            algorithm,
            dry_run: cli.dry_run || file.dry_run.unwrap_or(false),
        })
    }
}

impl Cli {
    /// Read the config file (explicit or default) and resolve the final configuration.
    pub fn load_config(&self) -> anyhow::Result<SyncConfig> {
        let file = match &self.config {
            Some(path) => FileConfig::load(path)?,
            None => match FileConfig::default_path().filter(|p| p.is_file()) {
                Some(path) => FileConfig::load(&path)?,
                None => FileConfig::default(),
            },
        };
        Ok(SyncConfig::resolve(self, file)?)
    }
}

/// Compares resolved locations when both exist, so `a/../b` or a symlink
/// to the source is caught too.
fn same_directory(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn required<T>(value: Option<T>, name: &str) -> Result<T, SyncError> {
    value.ok_or_else(|| SyncError::InvalidConfig {
        message: format!("missing --{} (or `{}` in the config file)", name, name.replace('-', "_")),
    })
}
