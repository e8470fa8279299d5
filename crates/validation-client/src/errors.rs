//! Client-side error types.

use thiserror::Error;

/// Errors constructing or operating a validation client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configuration entry has no URL.
    #[error("validation server url is empty")]
    EmptyUrl,

    /// Building the underlying HTTP client failed.
    #[error("building client for {url}: {reason}")]
    Build { url: String, reason: String },
}

impl ClientError {
    pub fn build(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Build {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}
