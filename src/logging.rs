// Logging is file-only: the terminal is in raw mode and owned by the UI for the
// whole run, so anything written to stdout/stderr would corrupt the screen.

use std::fs::{self, OpenOptions};
use std::path::Path;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Build the filter from `RUST_LOG` when set, else from `level` plus quieter
/// defaults for the HTTP stack.
fn build_env_filter(level: &str) -> anyhow::Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut directives = vec![level.to_string()];
    let noisy: &[(&str, &str)] = &[
        ("hyper", "warn"),
        ("hyper_util", "warn"),
        ("reqwest", "warn"),
        ("rustls", "warn"),
        ("h2", "warn"),
    ];
    for (target, lvl) in noisy {
        directives.push(format!("{target}={lvl}"));
    }

    let filter_str = directives.join(",");
    EnvFilter::try_new(&filter_str)
        .map_err(|e| anyhow::anyhow!("Invalid tracing filter '{}': {}", filter_str, e))
}

/// Install the global subscriber, appending to `file_path`.
pub fn init_logging(level: &str, file_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file_path)?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(log_file)
        .with_target(true)
        .with_filter(build_env_filter(level)?);

    tracing_subscriber::registry().with(file_layer).try_init()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_file = %file_path.display(),
        "logging initialized"
    );
    Ok(())
}
