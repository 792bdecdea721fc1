//! Secret store adapter.
//!
//! The session list persists as one opaque blob in an encrypted store the
//! platform owns. [`SecretStore`] is the contract the cache consumes;
//! [`KeyringStore`] is the production implementation over the OS keychain.
//! Encryption at rest is the keychain's job, not ours.

use anyhow::{Context, Result};
use async_trait::async_trait;
use keyring::Entry;

/// Keychain service name shared by all providers.
const SERVICE_NAME: &str = "authvault";

/// Opaque get/set/delete of a single persisted blob.
///
/// Failures are generic I/O errors; the cache never retries them.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Read the blob, or `None` if nothing has been stored yet.
    async fn get(&self) -> Result<Option<String>>;

    /// Replace the blob wholesale.
    async fn set(&self, blob: &str) -> Result<()>;

    /// Remove the blob. Deleting an absent blob is not an error.
    async fn delete(&self) -> Result<()>;
}

/// Session blob storage in the OS keychain, one entry per provider id.
pub struct KeyringStore {
    service: String,
    account: String,
}

impl KeyringStore {
    pub fn new(provider_id: &str) -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
            account: format!("{}.auth", provider_id),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(&self.service, &self.account).context("Failed to create keyring entry")
    }
}

#[async_trait]
impl SecretStore for KeyringStore {
    async fn get(&self) -> Result<Option<String>> {
        match self.entry()?.get_password() {
            Ok(blob) => Ok(Some(blob)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read session blob from keychain"),
        }
    }

    async fn set(&self, blob: &str) -> Result<()> {
        self.entry()?
            .set_password(blob)
            .context("Failed to store session blob in keychain")
    }

    async fn delete(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete session blob from keychain"),
        }
    }
}
