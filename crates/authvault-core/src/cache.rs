//! The session cache state machine.
//!
//! `SessionCache` owns the authoritative in-memory session list and mediates
//! every read and write through the secret store and the blob codec. The list
//! loads lazily on first access; legacy entries without an attached account
//! are verified against the remote identity resolver on the way in. Mutating
//! operations persist the full list (replace, not incremental) and publish
//! one change event each.
//!
//! All operations on one cache instance serialize on the state lock, so a
//! login and a concurrent logout always observe a consistent base list.
//! Consistency across instances sharing one store is eventual: the host
//! forwards its store-changed signal to [`SessionCache::check_for_updates`].

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::codec;
use crate::error::AuthError;
use crate::events::{ChangeNotifier, SessionChangeEvent};
use crate::provider::SessionProvider;
use crate::remote::{IdentityResolver, LoginFlow};
use crate::session::{scope_key, Session};
use crate::store::SecretStore;

pub struct SessionCache {
    store: Arc<dyn SecretStore>,
    resolver: Arc<dyn IdentityResolver>,
    login: Arc<dyn LoginFlow>,
    /// `None` until the first load pass has run.
    state: Mutex<Option<Vec<Session>>>,
    notifier: ChangeNotifier,
}

impl SessionCache {
    pub fn new(
        store: Arc<dyn SecretStore>,
        resolver: Arc<dyn IdentityResolver>,
        login: Arc<dyn LoginFlow>,
    ) -> Self {
        Self {
            store,
            resolver,
            login,
            state: Mutex::new(None),
            notifier: ChangeNotifier::new(),
        }
    }

    /// Subscribe to added/removed session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionChangeEvent> {
        self.notifier.subscribe()
    }

    /// Sessions whose scope set exactly matches `scope_filter` (order does
    /// not matter), or all sessions when no filter is given.
    pub async fn sessions(&self, scope_filter: Option<&[String]>) -> Vec<Session> {
        let mut state = self.state.lock().await;
        let sessions = self.loaded(&mut state).await;

        match scope_filter {
            None => {
                debug!("Got {} sessions for all scopes", sessions.len());
                sessions.clone()
            }
            Some(filter) => {
                let key = scope_key(filter);
                let matched: Vec<Session> = sessions
                    .iter()
                    .filter(|s| s.matches_scope_key(&key))
                    .cloned()
                    .collect();
                debug!(scopes = %key, "Got {} sessions", matched.len());
                matched
            }
        }
    }

    /// Log in for the given scopes and cache the resulting session.
    ///
    /// An existing session with the same scope set is replaced in place; the
    /// stored session keeps the caller's scope order. A cancelled login
    /// propagates [`AuthError::Cancelled`] without touching any state.
    pub async fn create_session(&self, scopes: &[String]) -> Result<Session, AuthError> {
        let key = scope_key(scopes);
        info!(scopes = %key, "Logging in...");

        let token = match self.login.login(&key).await {
            Ok(token) => token,
            Err(AuthError::Cancelled) => {
                info!("Login cancelled");
                return Err(AuthError::Cancelled);
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                return Err(e);
            }
        };

        // A token the host just minted should never be rejected; if it is,
        // that is a login failure, not a stale credential.
        let account = match self.resolver.resolve(&token).await {
            Ok(account) => account,
            Err(AuthError::Unauthorized) => {
                error!("Freshly issued token was rejected by the remote host");
                return Err(AuthError::AuthFailure(
                    "freshly issued token was rejected".to_string(),
                ));
            }
            Err(e) => {
                error!(error = %e, "Could not resolve identity for new token");
                return Err(e);
            }
        };

        let session = Session {
            id: Uuid::new_v4().to_string(),
            account,
            scopes: scopes.to_vec(),
            access_token: token,
        };

        let mut state = self.state.lock().await;
        let sessions = self.loaded(&mut state).await;
        match sessions
            .iter()
            .position(|s| s.id == session.id || s.matches_scope_key(&key))
        {
            Some(index) => sessions[index] = session.clone(),
            None => sessions.push(session.clone()),
        }

        let snapshot = sessions.clone();
        if let Err(e) = self.persist(&snapshot).await {
            error!(error = %e, "Failed to persist sessions after login");
            return Err(e);
        }

        self.notifier.emit(SessionChangeEvent::added(session.clone()));
        info!("Login success");
        Ok(session)
    }

    /// Remove a session by id, persisting the shrunken list.
    ///
    /// An unknown id is logged and ignored. A persistence failure surfaces
    /// after the in-memory removal has already happened; the caller should
    /// reconcile with a fresh read or [`SessionCache::check_for_updates`].
    pub async fn remove_session(&self, id: &str) -> Result<(), AuthError> {
        info!(session = id, "Logging out...");

        let mut state = self.state.lock().await;
        let sessions = self.loaded(&mut state).await;
        let Some(index) = sessions.iter().position(|s| s.id == id) else {
            error!(session = id, "Session not found");
            return Ok(());
        };

        let removed = sessions.remove(index);
        let snapshot = sessions.clone();
        if let Err(e) = self.persist(&snapshot).await {
            error!(error = %e, "Failed to persist sessions after logout");
            return Err(e);
        }

        self.notifier.emit(SessionChangeEvent::removed(removed));
        Ok(())
    }

    /// Reconcile with the persisted store after another instance wrote it.
    ///
    /// Diffs the in-memory list against a fresh load by id, replaces the
    /// list unconditionally, and emits one combined event if anything was
    /// added or removed.
    pub async fn check_for_updates(&self) {
        let mut state = self.state.lock().await;
        let previous = self.loaded(&mut state).await.clone();
        let fresh = self.read_sessions().await;

        let mut event = SessionChangeEvent::default();
        for session in &fresh {
            if !previous.iter().any(|s| s.id == session.id) {
                debug!(session = %session.id, "Adding session found in the secret store");
                event.added.push(session.clone());
            }
        }
        for session in &previous {
            if !fresh.iter().any(|s| s.id == session.id) {
                debug!(session = %session.id, "Removing session no longer in the secret store");
                event.removed.push(session.clone());
            }
        }

        *state = Some(fresh);
        self.notifier.emit(event);
    }

    /// The in-memory list, loading it from the store on first access.
    /// Runs under the state lock, so concurrent callers share one load.
    async fn loaded<'a>(&self, state: &'a mut Option<Vec<Session>>) -> &'a mut Vec<Session> {
        if state.is_none() {
            *state = Some(self.read_sessions().await);
        }
        state.get_or_insert_with(Vec::new)
    }

    /// The load/verify pass.
    ///
    /// An absent or unreadable store reads as no sessions. A corrupt blob is
    /// deleted and reads as no sessions. Duplicate scope sets drop all but
    /// the first entry. Legacy entries verify against the resolver: a
    /// rejected token drops that entry, while any other verification failure
    /// fails the whole pass closed - better no sessions than unverified
    /// ones. Any drop re-persists the cleaned list.
    async fn read_sessions(&self) -> Vec<Session> {
        debug!("Reading sessions from the secret store...");
        let blob = match self.store.get().await {
            Ok(Some(blob)) => blob,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read session blob");
                return Vec::new();
            }
        };

        let raw = match codec::decode(&blob) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Session blob is corrupted, discarding it");
                if let Err(e) = self.store.delete().await {
                    warn!(error = %e, "Failed to delete corrupted session blob");
                }
                return Vec::new();
            }
        };

        let raw_count = raw.len();
        let mut scopes_seen = HashSet::new();
        let mut verified = Vec::new();
        for entry in raw {
            let key = scope_key(&entry.scopes);
            if !scopes_seen.insert(key.clone()) {
                debug!(scopes = %key, "Dropping duplicate entry for scope set");
                continue;
            }

            let account = match entry.resolved_account() {
                Some(account) => account,
                None => match self.resolver.resolve(&entry.access_token).await {
                    Ok(account) => {
                        info!(scopes = %key, "Verified legacy session");
                        account
                    }
                    Err(AuthError::Unauthorized) => {
                        info!(scopes = %key, "Dropping session no longer authorized");
                        continue;
                    }
                    Err(e) => {
                        // A transient failure must not let possibly-stale
                        // unverified sessions through.
                        warn!(error = %e, "Session verification failed, treating the store as unreadable");
                        return Vec::new();
                    }
                },
            };

            verified.push(Session {
                id: entry.id,
                account,
                scopes: entry.scopes,
                access_token: entry.access_token,
            });
        }

        debug!("Got {} verified sessions", verified.len());
        if verified.len() != raw_count {
            if let Err(e) = self.persist(&verified).await {
                warn!(error = %e, "Failed to re-persist cleaned session list");
            }
        }

        verified
    }

    /// Replace the persisted blob with a snapshot of the full list.
    async fn persist(&self, sessions: &[Session]) -> Result<(), AuthError> {
        debug!("Storing {} sessions...", sessions.len());
        let blob = codec::encode(sessions)?;
        self.store.set(&blob).await.map_err(AuthError::Storage)?;
        Ok(())
    }
}

#[async_trait]
impl SessionProvider for SessionCache {
    async fn sessions(&self, scope_filter: Option<&[String]>) -> Vec<Session> {
        SessionCache::sessions(self, scope_filter).await
    }

    async fn create_session(&self, scopes: &[String]) -> Result<Session, AuthError> {
        SessionCache::create_session(self, scopes).await
    }

    async fn remove_session(&self, id: &str) -> Result<(), AuthError> {
        SessionCache::remove_session(self, id).await
    }

    async fn check_for_updates(&self) {
        SessionCache::check_for_updates(self).await
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChangeEvent> {
        SessionCache::subscribe(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
