use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, ensure};
use clap::Parser;
use userdir_feed::FeedOptions;

pub const DEFAULT_BASE_URL: &str = "https://tech-test.raintor.com/api/users";

/// Browse a paginated user directory in the terminal.
#[derive(Debug, Parser)]
#[command(name = "userdir", version, about)]
pub struct Cli {
    /// Base URL of the users API; pages are read from `<base>/GetUsersList`.
    #[arg(long, env = "USERDIR_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Users requested per page.
    #[arg(long, env = "USERDIR_PAGE_SIZE", default_value_t = 10)]
    pub page_size: usize,

    /// Terminal rows per user card.
    #[arg(long, default_value_t = 6)]
    pub item_height: u16,

    /// Cards rendered beyond each edge of the viewport.
    #[arg(long, default_value_t = 2)]
    pub overscan: usize,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Where log output goes; the terminal belongs to the UI.
    #[arg(long, default_value = "userdir.log")]
    pub log_file: PathBuf,

    /// Default log level. `RUST_LOG` takes precedence when set.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Validated runtime configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub page_size: usize,
    pub item_height: u16,
    pub overscan: usize,
    pub timeout: Duration,
    pub log_file: PathBuf,
    pub log_level: String,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let base_url = cli.base_url.trim().to_string();
        ensure!(
            base_url.starts_with("http://") || base_url.starts_with("https://"),
            "base URL must start with http:// or https://, got '{base_url}'"
        );
        ensure!(
            base_url.split("://").nth(1).is_some_and(|rest| !rest.is_empty()),
            "base URL '{base_url}' has no host"
        );
        ensure!(cli.page_size > 0, "page size must be at least 1");
        ensure!(cli.item_height > 0, "item height must be at least 1");
        ensure!(cli.timeout_secs > 0, "timeout must be at least one second");

        Ok(Self {
            base_url,
            page_size: cli.page_size,
            item_height: cli.item_height,
            overscan: cli.overscan,
            timeout: Duration::from_secs(cli.timeout_secs),
            log_file: cli.log_file,
            log_level: cli.log_level,
        })
    }

    pub fn feed_options(&self) -> FeedOptions {
        FeedOptions {
            page_size: self.page_size,
            item_height: u32::from(self.item_height),
            overscan: self.overscan,
            ..FeedOptions::default()
        }
    }
}
