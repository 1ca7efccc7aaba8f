use thiserror::Error;

/// Errors produced by calls against the chess backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The request never completed: DNS, connect, timeout, or a broken body.
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status code.
    #[error("backend returned HTTP {status}")]
    Status { status: u16 },

    /// The backend answered 2xx but the body was not the JSON we expect.
    #[error("malformed backend response: {0}")]
    Parse(#[from] serde_json::Error),
}
