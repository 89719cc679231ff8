//! Registration, school directory, profile and dashboard.

use glt_core::{Dashboard, Email, NewUser, UserProfile};
use secrecy::SecretString;
use tracing::{info, instrument};

use crate::api::{ApiClient, ApiError};
use crate::error::ClientError;
use crate::services::tokens::TokenStore;

/// Registration form as entered, before validation.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub email: String,
    pub name: String,
    pub grade: String,
    pub school: String,
    pub password: SecretString,
}

impl TryFrom<Registration> for NewUser {
    type Error = ClientError;

    fn try_from(form: Registration) -> Result<Self, Self::Error> {
        Ok(Self {
            email: Email::parse(&form.email)?,
            name: form.name.trim().to_string(),
            grade: form.grade.trim().to_string(),
            school: form.school.trim().to_string(),
            password: form.password,
        })
    }
}

/// Account endpoints that need no local state beyond the bearer token.
#[derive(Clone)]
pub struct AccountService {
    api: ApiClient,
    tokens: TokenStore,
}

impl AccountService {
    #[must_use]
    pub const fn new(api: ApiClient, tokens: TokenStore) -> Self {
        Self { api, tokens }
    }

    /// Register a new student account.
    ///
    /// The email is validated locally before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEmail` for a malformed address, otherwise the
    /// server's rejection.
    #[instrument(skip_all)]
    pub async fn register(&self, form: Registration) -> Result<serde_json::Value, ClientError> {
        let user = NewUser::try_from(form)?;
        let created = self.api.register(&user).await?;
        info!(email = %user.email, "Registered account");
        Ok(created)
    }

    /// Schools offered at registration.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn schools(&self) -> Result<Vec<String>, ClientError> {
        Ok(self.api.schools().await?)
    }

    /// # Errors
    ///
    /// Returns an error if not logged in or the request fails.
    pub async fn profile(&self) -> Result<UserProfile, ClientError> {
        let token = self.access_token()?;
        Ok(self.api.profile(&token).await?)
    }

    /// # Errors
    ///
    /// Returns an error if not logged in or the request fails.
    pub async fn dashboard(&self) -> Result<Dashboard, ClientError> {
        let token = self.access_token()?;
        Ok(self.api.dashboard(&token).await?)
    }

    fn access_token(&self) -> Result<String, ClientError> {
        self.tokens
            .access_token()
            .ok_or_else(|| ApiError::NotAuthenticated.into())
    }
}
