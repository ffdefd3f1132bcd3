use std::future::Future;

use crate::{FetchError, Page};
#[cfg(feature = "http")]
use crate::PageEnvelope;

/// Retrieves one page of the user list.
///
/// Implementations perform exactly one request per call and never retry; retry policy belongs
/// to the caller.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, page_index: usize) -> impl Future<Output = Result<Page, FetchError>> + Send;
}

/// `skip` value for a page index.
pub fn page_skip(page_index: usize, page_size: usize) -> u64 {
    (page_index as u64).saturating_mul(page_size as u64)
}

/// Builds `<base>/GetUsersList?take=<page_size>&skip=<page_index * page_size>`.
pub fn page_url(base_url: &str, page_size: usize, page_index: usize) -> String {
    format!(
        "{}/GetUsersList?take={}&skip={}",
        base_url.trim_end_matches('/'),
        page_size,
        page_skip(page_index, page_size)
    )
}

#[cfg(feature = "http")]
pub use http::HttpFetcher;

#[cfg(feature = "http")]
mod http {
    use std::time::Duration;

    use super::*;

    const USER_AGENT: &str = concat!("userdir/", env!("CARGO_PKG_VERSION"));

    /// [`Fetcher`] backed by a `reqwest` client.
    #[derive(Clone, Debug)]
    pub struct HttpFetcher {
        client: reqwest::Client,
        base_url: String,
        page_size: usize,
    }

    impl HttpFetcher {
        /// Creates a fetcher with its own client and a per-request `timeout`.
        pub fn new(
            base_url: impl Into<String>,
            page_size: usize,
            timeout: Duration,
        ) -> Result<Self, FetchError> {
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .user_agent(USER_AGENT)
                .build()?;
            Ok(Self::with_client(client, base_url, page_size))
        }

        pub fn with_client(
            client: reqwest::Client,
            base_url: impl Into<String>,
            page_size: usize,
        ) -> Self {
            Self {
                client,
                base_url: base_url.into(),
                page_size: page_size.max(1),
            }
        }

        pub fn base_url(&self) -> &str {
            &self.base_url
        }

        pub fn page_size(&self) -> usize {
            self.page_size
        }

        pub fn page_url(&self, page_index: usize) -> String {
            page_url(&self.base_url, self.page_size, page_index)
        }
    }

    impl Fetcher for HttpFetcher {
        async fn fetch(&self, page_index: usize) -> Result<Page, FetchError> {
            let url = self.page_url(page_index);
            fdebug!(page_index, url = %url, "fetching page");

            let response = self.client.get(&url).send().await?;
            let status = response.status();
            if !status.is_success() {
                fwarn!(page_index, status = status.as_u16(), "page request failed");
                return Err(FetchError::Server {
                    status: status.as_u16(),
                    status_text: status.canonical_reason().unwrap_or_default().to_string(),
                });
            }

            let body = response.bytes().await?;
            let envelope: PageEnvelope = serde_json::from_slice(&body)?;
            ftrace!(
                page_index,
                users = envelope.users.len(),
                total = envelope.total,
                "page decoded"
            );
            Ok(Page::from_envelope(page_index, envelope))
        }
    }
}
