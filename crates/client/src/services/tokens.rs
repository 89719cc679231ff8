//! Persistent bearer token holder.
//!
//! Holds the access/refresh pair in memory as secrets and mirrors it to
//! durable storage under [`keys::TOKENS`]. Authentication state is simply the
//! presence of a non-empty access token; expiry is never checked locally.

use std::sync::{Arc, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::storage::{KeyValueStore, keys, load_json, save_json};

/// Access/refresh token pair.
///
/// `Debug` output is redacted by `SecretString`.
#[derive(Debug, Clone)]
pub struct AuthTokens {
    pub access: SecretString,
    pub refresh: SecretString,
}

impl AuthTokens {
    #[must_use]
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: SecretString::from(access.into()),
            refresh: SecretString::from(refresh.into()),
        }
    }
}

/// On-disk shape of [`AuthTokens`].
#[derive(Serialize, Deserialize)]
struct StoredTokens {
    access: String,
    refresh: String,
}

impl From<&AuthTokens> for StoredTokens {
    fn from(tokens: &AuthTokens) -> Self {
        Self {
            access: tokens.access.expose_secret().to_string(),
            refresh: tokens.refresh.expose_secret().to_string(),
        }
    }
}

impl From<StoredTokens> for AuthTokens {
    fn from(stored: StoredTokens) -> Self {
        Self::new(stored.access, stored.refresh)
    }
}

/// Shared token holder.
///
/// Cheap to clone; clones share the same tokens.
#[derive(Clone)]
pub struct TokenStore {
    inner: Arc<TokenStoreInner>,
}

struct TokenStoreInner {
    storage: Arc<dyn KeyValueStore>,
    tokens: RwLock<Option<AuthTokens>>,
}

impl TokenStore {
    /// Open the store, rehydrating persisted tokens.
    #[must_use]
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let tokens = match load_json::<StoredTokens>(storage.as_ref(), keys::TOKENS) {
            Ok(stored) => stored.map(AuthTokens::from),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable persisted tokens");
                None
            }
        };

        Self {
            inner: Arc::new(TokenStoreInner {
                storage,
                tokens: RwLock::new(tokens),
            }),
        }
    }

    /// Replace both tokens.
    pub fn set(&self, tokens: AuthTokens) {
        let mut guard = self.write();
        self.persist(Some(&tokens));
        *guard = Some(tokens);
    }

    /// Replace only the access token, keeping the refresh token.
    ///
    /// Does nothing when no tokens are held.
    pub fn replace_access(&self, access: impl Into<String>) {
        let mut guard = self.write();
        if let Some(tokens) = guard.as_mut() {
            tokens.access = SecretString::from(access.into());
            self.persist(Some(&*tokens));
        }
    }

    /// Drop both tokens, locally and in storage.
    pub fn clear(&self) {
        let mut guard = self.write();
        *guard = None;
        self.persist(None);
    }

    /// Current access token, if a non-empty one is held.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.read()
            .as_ref()
            .map(|t| t.access.expose_secret().to_string())
            .filter(|access| !access.is_empty())
    }

    /// Current refresh token, if a non-empty one is held.
    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.read()
            .as_ref()
            .map(|t| t.refresh.expose_secret().to_string())
            .filter(|refresh| !refresh.is_empty())
    }

    /// Whether a non-empty access token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<AuthTokens>> {
        self.inner
            .tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<AuthTokens>> {
        self.inner
            .tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, tokens: Option<&AuthTokens>) {
        let storage = self.inner.storage.as_ref();
        let result = match tokens {
            Some(tokens) => save_json(storage, keys::TOKENS, &StoredTokens::from(tokens)),
            None => storage.remove(keys::TOKENS),
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to persist tokens");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_set_persists_and_authenticates() {
        let storage = Arc::new(MemoryStore::new());
        let tokens = TokenStore::load(storage.clone());
        assert!(!tokens.is_authenticated());

        tokens.set(AuthTokens::new("access-1", "refresh-1"));
        assert!(tokens.is_authenticated());
        assert_eq!(tokens.access_token().as_deref(), Some("access-1"));
        assert_eq!(
            storage.get(keys::TOKENS).unwrap().as_deref(),
            Some(r#"{"access":"access-1","refresh":"refresh-1"}"#)
        );
    }

    #[test]
    fn test_replace_access_keeps_refresh() {
        let tokens = TokenStore::load(Arc::new(MemoryStore::new()));
        tokens.set(AuthTokens::new("a1", "r1"));
        tokens.replace_access("a2");
        assert_eq!(tokens.access_token().as_deref(), Some("a2"));
        assert_eq!(tokens.refresh_token().as_deref(), Some("r1"));
    }

    #[test]
    fn test_replace_access_without_tokens_is_noop() {
        let tokens = TokenStore::load(Arc::new(MemoryStore::new()));
        tokens.replace_access("a2");
        assert!(!tokens.is_authenticated());
    }

    #[test]
    fn test_empty_access_token_is_not_authenticated() {
        let tokens = TokenStore::load(Arc::new(MemoryStore::new()));
        tokens.set(AuthTokens::new("", "r1"));
        assert!(!tokens.is_authenticated());
    }

    #[test]
    fn test_clear_removes_persisted_tokens() {
        let storage = Arc::new(MemoryStore::new());
        let tokens = TokenStore::load(storage.clone());
        tokens.set(AuthTokens::new("a", "r"));
        tokens.clear();
        assert!(!tokens.is_authenticated());
        assert!(storage.get(keys::TOKENS).unwrap().is_none());
    }

    #[test]
    fn test_rehydrates_from_storage() {
        let storage = Arc::new(MemoryStore::new());
        TokenStore::load(storage.clone()).set(AuthTokens::new("a", "r"));

        let reopened = TokenStore::load(storage);
        assert_eq!(reopened.access_token().as_deref(), Some("a"));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let debug = format!("{:?}", AuthTokens::new("super-secret-access", "super-secret-refresh"));
        assert!(!debug.contains("super-secret"));
    }
}
