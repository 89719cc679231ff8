//! Session lifecycle: login, logout and background token refresh.
//!
//! # Refresh task
//!
//! A successful login (or a restore from persisted tokens) starts a task that
//! refreshes the access token once per configured interval, regardless of the
//! token's actual age. The task stops when the session logs out, when a
//! refresh fails, or when the last `Session` handle is dropped. A failed
//! refresh clears all tokens rather than retrying.
//!
//! ```rust,ignore
//! let session = Session::new(api, tokens, Duration::from_secs(240));
//! session.login("ada@example.org", "hunter22").await?;
//! assert!(session.is_authenticated());
//! session.logout().await;
//! ```

use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiError, AuthApi};
use crate::error::ClientError;
use crate::services::tokens::{AuthTokens, TokenStore};

/// Authentication session over an [`AuthApi`].
///
/// Cheap to clone; clones share tokens and the refresh task.
pub struct Session<A: AuthApi> {
    inner: Arc<SessionInner<A>>,
}

impl<A: AuthApi> Clone for Session<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct SessionInner<A> {
    api: A,
    tokens: TokenStore,
    refresh_interval: Duration,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl<A: AuthApi> Session<A> {
    /// Create a session over already-loaded tokens.
    ///
    /// No refresh task runs until [`login`](Self::login) or
    /// [`restore`](Self::restore) is called.
    #[must_use]
    pub fn new(api: A, tokens: TokenStore, refresh_interval: Duration) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                api,
                tokens,
                refresh_interval,
                refresh_task: Mutex::new(None),
            }),
        }
    }

    /// The token holder this session manages.
    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    /// Whether a non-empty access token is held. Expiry is not checked.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.tokens.is_authenticated()
    }

    /// Bearer token for an authenticated call.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when no access token is held.
    pub fn access_token(&self) -> Result<String, ClientError> {
        self.inner
            .tokens
            .access_token()
            .ok_or_else(|| ApiError::NotAuthenticated.into())
    }

    /// Log in with email and password.
    ///
    /// On success the tokens are stored and the refresh task starts.
    ///
    /// # Errors
    ///
    /// Returns the API error (carrying the server's message) if login fails.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ClientError> {
        let tokens = match self.inner.api.login(email, password).await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(error = %e, "Login failed");
                return Err(e.into());
            }
        };

        self.inner
            .tokens
            .set(AuthTokens::new(tokens.access, tokens.refresh));
        self.start_refresh_task();
        info!("Logged in");
        Ok(())
    }

    /// Log out.
    ///
    /// Stops the refresh task, asks the server to blacklist the refresh token
    /// (failures are only logged), then clears local tokens unconditionally.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        self.stop_refresh_task();

        if let Some(refresh) = self.inner.tokens.refresh_token()
            && let Err(e) = self.inner.api.blacklist(&refresh).await
        {
            warn!(error = %e, "Failed to blacklist refresh token");
        }

        self.inner.tokens.clear();
        info!("Logged out");
    }

    /// Refresh the access token now.
    ///
    /// Only the access half of the stored pair is replaced. On any failure
    /// all tokens are cleared and the refresh task is stopped.
    ///
    /// # Errors
    ///
    /// Returns an error if no refresh token is held or the refresh fails.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let result = self.inner.refresh_tokens().await;
        if result.is_err() {
            self.stop_refresh_task();
        }
        result
    }

    /// Resume the refresh task for tokens rehydrated from storage.
    ///
    /// Returns whether the session is authenticated.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime while tokens are present.
    pub fn restore(&self) -> bool {
        let authenticated = self.is_authenticated();
        if authenticated {
            debug!("Restored session from persisted tokens");
            self.start_refresh_task();
        }
        authenticated
    }

    /// Whether the background refresh task is currently running.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.inner
            .refresh_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    fn start_refresh_task(&self) {
        let weak = Arc::downgrade(&self.inner);
        let period = self.inner.refresh_interval;
        let task = tokio::spawn(refresh_loop(weak, period));

        let previous = self
            .inner
            .refresh_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    fn stop_refresh_task(&self) {
        self.inner.stop_refresh_task();
    }
}

impl<A: AuthApi> SessionInner<A> {
    async fn refresh_tokens(&self) -> Result<(), ClientError> {
        let Some(refresh) = self.tokens.refresh_token() else {
            self.tokens.clear();
            return Err(ApiError::NotAuthenticated.into());
        };

        match self.api.refresh(&refresh).await {
            Ok(refreshed) => {
                self.tokens.replace_access(refreshed.access);
                debug!("Access token refreshed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing session");
                self.tokens.clear();
                Err(e.into())
            }
        }
    }

    fn stop_refresh_task(&self) {
        let task = self
            .refresh_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
            debug!("Stopped token refresh task");
        }
    }
}

impl<A> Drop for SessionInner<A> {
    fn drop(&mut self) {
        let task = self
            .refresh_task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }
    }
}

/// Refresh once per `period` until a refresh fails or the session is gone.
///
/// Holds only a weak reference so the task never keeps a dropped session alive.
async fn refresh_loop<A: AuthApi>(session: Weak<SessionInner<A>>, period: Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(session) = session.upgrade() else {
            break;
        };
        if session.refresh_tokens().await.is_err() {
            break;
        }
    }

    debug!("Token refresh loop finished");
}
