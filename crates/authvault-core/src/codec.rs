//! Codec for the persisted session-list blob.
//!
//! The secret store holds a single JSON array of session entries. Decoding is
//! tolerant of the legacy shape: entries written before accounts were
//! attached have no `account` field, and the oldest ones carried the account
//! name under `displayName` instead of `label`. Encoding always writes the
//! current shape.

use serde::Deserialize;

use crate::error::AuthError;
use crate::session::{Session, SessionAccount};

/// Placeholder for account fields the blob never recorded.
const UNKNOWN_ACCOUNT: &str = "<unknown>";

#[derive(Debug, Clone, Deserialize)]
pub struct StoredAccount {
    pub id: Option<String>,
    pub label: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
}

/// One entry as it appears in the persisted blob. `account` is absent for
/// legacy entries that still need verification against the remote host.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub id: String,
    #[serde(default)]
    pub account: Option<StoredAccount>,
    pub scopes: Vec<String>,
    pub access_token: String,
}

impl StoredSession {
    /// The account recorded in the blob, if this entry has one.
    /// Falls back through the legacy `displayName` field for the label.
    pub fn resolved_account(&self) -> Option<SessionAccount> {
        let stored = self.account.as_ref()?;
        Some(SessionAccount {
            id: stored
                .id
                .clone()
                .unwrap_or_else(|| UNKNOWN_ACCOUNT.to_string()),
            label: stored
                .label
                .clone()
                .or_else(|| stored.display_name.clone())
                .unwrap_or_else(|| UNKNOWN_ACCOUNT.to_string()),
        })
    }
}

/// Parse a persisted blob into its raw entries.
///
/// Fails with [`AuthError::CorruptData`] if the blob is not well-formed; the
/// caller is expected to delete the blob rather than retry.
pub fn decode(blob: &str) -> Result<Vec<StoredSession>, AuthError> {
    Ok(serde_json::from_str(blob)?)
}

/// Serialize a session list into the blob format.
pub fn encode(sessions: &[Session]) -> Result<String, AuthError> {
    Ok(serde_json::to_string(sessions)?)
}
