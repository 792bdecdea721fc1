use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("malformed session data: {0}")]
    CorruptData(#[from] serde_json::Error),

    #[error("Unauthorized - token rejected by the remote host")]
    Unauthorized,

    #[error("login was cancelled")]
    Cancelled,

    #[error("secret storage failure: {0}")]
    Storage(anyhow::Error),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("authentication failed: {0}")]
    AuthFailure(String),
}

impl AuthError {
    /// User-initiated aborts are silent; everything else is worth showing.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AuthError::Cancelled)
    }
}
