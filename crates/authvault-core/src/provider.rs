//! Host-facing capability surface.
//!
//! A host integration layer (editor window, account picker, telemetry
//! collaborator) holds the cache as a `dyn SessionProvider` and never sees
//! the storage or verification machinery behind it.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::AuthError;
use crate::events::SessionChangeEvent;
use crate::session::Session;

/// The capability set a session cache exposes to its host.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Sessions matching the scope filter (order-insensitive exact match),
    /// or all sessions when no filter is given. Never fails; an empty or
    /// unreadable store reads as no sessions.
    async fn sessions(&self, scope_filter: Option<&[String]>) -> Vec<Session>;

    /// Run the login flow for `scopes` and cache the resulting session,
    /// replacing any existing session with the same scope set.
    async fn create_session(&self, scopes: &[String]) -> Result<Session, AuthError>;

    /// Remove a session by id. Removing an unknown id is a no-op.
    async fn remove_session(&self, id: &str) -> Result<(), AuthError>;

    /// Reconcile with the persisted store after an out-of-band change
    /// (another process instance wrote the blob).
    async fn check_for_updates(&self);

    /// Subscribe to added/removed session events.
    fn subscribe(&self) -> broadcast::Receiver<SessionChangeEvent>;
}
