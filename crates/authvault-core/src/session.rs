//! Session data model.
//!
//! A `Session` is one cached authenticated credential: the bearer token, the
//! scopes it was granted, and the remote account it belongs to. Sessions are
//! matched and deduplicated by their scope set, not their scope order.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The remote identity a session belongs to.
/// `label` is a display name and is not guaranteed unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionAccount {
    pub id: String,
    pub label: String,
}

/// A cached authenticated session.
///
/// `scopes` keeps the order the caller originally requested; comparisons
/// always go through [`scope_key`] so ordering never affects identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub account: SessionAccount,
    pub scopes: Vec<String>,
    pub access_token: String,
}

impl Session {
    /// Whether this session's scope set matches the given normalized key.
    pub fn matches_scope_key(&self, key: &str) -> bool {
        scope_key(&self.scopes) == key
    }
}

/// Normalize a scope list into its canonical key: sorted, deduplicated,
/// space-joined. Two scope lists grant the same access iff their keys are
/// equal.
pub fn scope_key<S: AsRef<str>>(scopes: &[S]) -> String {
    scopes
        .iter()
        .map(|s| s.as_ref())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>()
        .join(" ")
}
