//! Authvault core - a credential session cache backed by the platform
//! keychain.
//!
//! The cache keeps an in-memory list of authenticated sessions, persisted as
//! a single encrypted blob in the OS keychain and kept eventually consistent
//! across application instances through change notifications. Hosts consume
//! it through the [`SessionProvider`] capability trait and plug in their own
//! login flow; identity verification runs against a GitHub-style `/user`
//! endpoint.

pub mod cache;
pub mod codec;
pub mod error;
pub mod events;
pub mod provider;
pub mod remote;
pub mod session;
pub mod store;

pub use cache::SessionCache;
pub use error::AuthError;
pub use events::SessionChangeEvent;
pub use provider::SessionProvider;
pub use remote::{GithubIdentityResolver, IdentityResolver, LoginFlow};
pub use session::{scope_key, Session, SessionAccount};
pub use store::{KeyringStore, SecretStore};
