/// Why a page could not be fetched.
///
/// Cloneable so the cache can retain the failure and the view can keep rendering it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The request never produced a response (DNS, connect, timeout, body read).
    #[error("Network error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("Failed to fetch: {status} {status_text}")]
    Server { status: u16, status_text: String },

    /// The body was not a `{users, total, skip, limit}` object.
    #[error("Malformed response: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Parse(e.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return FetchError::Server {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            };
        }
        if e.is_decode() {
            return FetchError::Parse(e.to_string());
        }
        FetchError::Transport(e.to_string())
    }
}
