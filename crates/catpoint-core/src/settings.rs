use clap::Parser;
use std::path::{Path, PathBuf};

use crate::error::{Result, SecurityError};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Home security controller with cat detection
#[derive(Parser, Debug, Clone)]
#[command(
    name = "catpoint",
    about = "Home security controller with cat detection",
    version
)]
pub struct Settings {
    /// State file (defaults to ~/.catpoint/state.json)
    #[arg(long, conflicts_with = "in_memory")]
    pub store: Option<PathBuf>,

    /// Keep all state in memory; nothing is written to disk
    #[arg(long)]
    pub in_memory: bool,

    /// Cat classifier used for camera frames
    #[arg(long, default_value = "heuristic", value_parser = ["heuristic", "always-cat", "never-cat"])]
    pub classifier: String,

    /// Sample every Nth pixel in the heuristic classifier
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub sample_stride: u32,

    /// Read commands from this file instead of standard input
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// Backing store selected by the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    File(PathBuf),
}

impl Settings {
    /// Parse the process arguments; exits with usage on error.
    pub fn load() -> Self {
        Self::parse().resolve()
    }

    /// Parse an explicit argument list, reporting problems as
    /// [`SecurityError::Config`] instead of exiting.
    pub fn try_load_from<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args)
            .map(Self::resolve)
            .map_err(|e| SecurityError::Config(e.to_string()))
    }

    /// Apply the `--debug` override.
    fn resolve(mut self) -> Self {
        if self.debug {
            self.log_level = "DEBUG".to_string();
        }
        self
    }

    /// Resolve the store location, falling back to the home directory.
    pub fn store_location(&self) -> StoreLocation {
        if self.in_memory {
            return StoreLocation::Memory;
        }
        match &self.store {
            Some(path) => StoreLocation::File(path.clone()),
            None => StoreLocation::File(default_store_path()),
        }
    }
}

/// `~/.catpoint/`, or `./.catpoint/` when the home directory is unknown.
pub fn config_dir() -> PathBuf {
    config_dir_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
}

/// The config directory rooted at `base_dir`.
pub fn config_dir_in(base_dir: &Path) -> PathBuf {
    base_dir.join(".catpoint")
}

/// Default state file inside [`config_dir`].
pub fn default_store_path() -> PathBuf {
    config_dir().join("state.json")
}

// ── Tests ──────────────────────────────────────────────────────────────────────
