use std::path::Path;

use anyhow::Context;
use catpoint_core::repository::{InMemoryRepository, JsonFileRepository, SecurityRepository};
use catpoint_core::settings::{Settings, StoreLocation};
use catpoint_image::StandInClassifier;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure `config_dir` exists, creating missing parents.
pub fn ensure_directories(config_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating {}", config_dir.display()))?;
    Ok(())
}

/// Create `config_dir` when the store lives at `default_path` inside it.
///
/// Returns whether the directory was prepared. An in-memory store or a file
/// elsewhere leaves the home directory alone.
pub fn ensure_store_directory(
    location: &StoreLocation,
    default_path: &Path,
    config_dir: &Path,
) -> anyhow::Result<bool> {
    match location {
        StoreLocation::File(path) if path == default_path => {
            ensure_directories(config_dir)?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a `--log-level` name to an [`EnvFilter`] directive.
///
/// Unknown names are passed through unchanged.
pub fn filter_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" => "error".to_string(),
        _ => log_level.to_lowercase(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Logs go to stderr so they never interleave with console replies on stdout.
/// Falls back to `"info"` if the level string is not a valid directive.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(filter_directive(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()
        .context("installing tracing subscriber")?;

    Ok(())
}

// ── Collaborators ──────────────────────────────────────────────────────────────

/// Open the store selected on the command line.
pub fn open_store(location: &StoreLocation) -> anyhow::Result<Box<dyn SecurityRepository>> {
    match location {
        StoreLocation::Memory => {
            tracing::info!("using in-memory store");
            Ok(Box::new(InMemoryRepository::new()))
        }
        StoreLocation::File(path) => {
            tracing::info!(path = %path.display(), "using file store");
            let repo = JsonFileRepository::open(path)
                .with_context(|| format!("opening store {}", path.display()))?;
            Ok(Box::new(repo))
        }
    }
}

/// Build the classifier selected on the command line.
pub fn build_classifier(settings: &Settings) -> anyhow::Result<StandInClassifier> {
    StandInClassifier::from_name(&settings.classifier, settings.sample_stride as usize)
        .with_context(|| format!("unknown classifier {}", settings.classifier))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
