//! GitHub API Error Types
//!
//! Remote failures are kept coarse: either the request never completed
//! (transport) or GitHub answered with a non-success status. Nothing in the
//! daemon retries or branches on the distinction.

/// GitHub API error types
#[derive(Debug, thiserror::Error)]
pub enum GhError {
    #[error("github request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("github api error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl GhError {
    /// Build an API error from a response status and body
    pub fn api(status: u16, body: String) -> Self {
        // Bodies can be large HTML error pages; keep the first line only
        let message = body.lines().next().unwrap_or_default().to_string();
        GhError::Api { status, message }
    }
}
