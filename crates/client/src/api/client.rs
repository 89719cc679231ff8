//! `reqwest`-backed implementation of the service traits.

use std::sync::Arc;

use glt_core::{
    Dashboard, NewUser, OrderConfirmation, OrderLine, Product, SandboxDescriptor, UserProfile,
};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument};
use url::Url;

use crate::config::ClientConfig;

use super::types::{
    ChatRequest, LoginRequest, PlaceOrderRequest, RefreshRequest, SchoolsResponse,
};
use super::{
    ApiError, AuthApi, ChatGateway, ChatReply, LoginTokens, RefreshedAccess, SandboxAction,
    SandboxApi, ShopApi, endpoints,
};

/// Maximum number of body characters carried into an error message.
const ERROR_BODY_LIMIT: usize = 200;

/// Client for the Girlz Love Tech HTTP services.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("glt-client/", env!("CARGO_PKG_VERSION")))
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: with_trailing_slash(config.api_base_url.clone()),
            }),
        })
    }

    /// Base URL all endpoint paths are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Unauthenticated endpoints
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a new account.
    ///
    /// Returns the created-user payload as sent by the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects the input.
    #[instrument(skip(self, user), fields(email = %user.email))]
    pub async fn register(&self, user: &NewUser) -> Result<serde_json::Value, ApiError> {
        let request = self
            .inner
            .client
            .post(self.url(endpoints::REGISTER)?)
            .json(user);
        execute(request).await
    }

    /// List the schools students can pick at registration.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn schools(&self) -> Result<Vec<String>, ApiError> {
        let request = self.inner.client.get(self.url(endpoints::SCHOOLS)?);
        let response: SchoolsResponse = execute(request).await?;
        Ok(response.schools)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // User endpoints
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetch the logged-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is rejected.
    #[instrument(skip_all)]
    pub async fn profile(&self, access_token: &str) -> Result<UserProfile, ApiError> {
        let request = self
            .inner
            .client
            .get(self.url(endpoints::USER)?)
            .bearer_auth(access_token);
        execute(request).await
    }

    /// Fetch the aggregated dashboard for the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is rejected.
    #[instrument(skip_all)]
    pub async fn dashboard(&self, access_token: &str) -> Result<Dashboard, ApiError> {
        let request = self
            .inner
            .client
            .get(self.url(endpoints::DASHBOARD)?)
            .bearer_auth(access_token);
        execute(request).await
    }
}

impl AuthApi for ApiClient {
    #[instrument(skip(self, password))]
    async fn login(&self, email: &str, password: &str) -> Result<LoginTokens, ApiError> {
        let request = self
            .inner
            .client
            .post(self.url(endpoints::LOGIN)?)
            .json(&LoginRequest { email, password });
        execute(request).await
    }

    #[instrument(skip_all)]
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedAccess, ApiError> {
        let request = self
            .inner
            .client
            .post(self.url(endpoints::TOKEN_REFRESH)?)
            .json(&RefreshRequest {
                refresh: refresh_token,
            });
        execute(request).await
    }

    #[instrument(skip_all)]
    async fn blacklist(&self, refresh_token: &str) -> Result<(), ApiError> {
        let request = self
            .inner
            .client
            .post(self.url(endpoints::TOKEN_BLACKLIST)?)
            .json(&RefreshRequest {
                refresh: refresh_token,
            });
        execute_empty(request).await
    }
}

impl ChatGateway for ApiClient {
    #[instrument(skip_all, fields(len = message.len()))]
    async fn send_message(&self, access_token: &str, message: &str) -> Result<ChatReply, ApiError> {
        let request = self
            .inner
            .client
            .post(self.url(endpoints::CHAT_MESSAGE)?)
            .bearer_auth(access_token)
            .json(&ChatRequest { message });
        execute(request).await
    }
}

impl ShopApi for ApiClient {
    #[instrument(skip_all)]
    async fn products(&self, access_token: &str) -> Result<Vec<Product>, ApiError> {
        let request = self
            .inner
            .client
            .get(self.url(endpoints::PRODUCTS)?)
            .bearer_auth(access_token);
        execute(request).await
    }

    #[instrument(skip_all, fields(lines = lines.len()))]
    async fn place_order(
        &self,
        access_token: &str,
        lines: &[OrderLine],
    ) -> Result<OrderConfirmation, ApiError> {
        let request = self
            .inner
            .client
            .post(self.url(endpoints::PLACE_ORDER)?)
            .bearer_auth(access_token)
            .json(&PlaceOrderRequest { products: lines });
        execute(request).await
    }
}

impl SandboxApi for ApiClient {
    #[instrument(skip_all)]
    async fn sandbox_status(&self, access_token: &str) -> Result<SandboxDescriptor, ApiError> {
        let request = self
            .inner
            .client
            .get(self.url(endpoints::SANDBOX)?)
            .bearer_auth(access_token);
        execute(request).await
    }

    #[instrument(skip(self, access_token))]
    async fn sandbox_action(
        &self,
        access_token: &str,
        action: SandboxAction,
    ) -> Result<SandboxDescriptor, ApiError> {
        let path = format!("{}/{}", endpoints::SANDBOX, action.segment());
        let request = self
            .inner
            .client
            .post(self.url(&path)?)
            .bearer_auth(access_token);
        execute(request).await
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Send a request and parse a JSON body from a success response.
async fn execute<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
    let response = request.send().await?;
    let status = response.status();

    // Body as text first for better error diagnostics
    let body = response.text().await?;

    if !status.is_success() {
        return Err(error_from_response(status, &body));
    }

    serde_json::from_str(&body).map_err(|e| {
        error!(
            error = %e,
            body = %truncate(&body, 500),
            "Failed to parse API response"
        );
        ApiError::Parse(e)
    })
}

/// Send a request whose success response carries no body of interest.
async fn execute_empty(request: RequestBuilder) -> Result<(), ApiError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            debug!(error = %e, status = %status, "Failed to read error response body");
            String::new()
        }
    };
    Err(error_from_response(status, &body))
}

/// Turn a non-success response into an [`ApiError`], keeping the server's text.
fn error_from_response(status: StatusCode, body: &str) -> ApiError {
    let message = extract_error_message(body)
        .unwrap_or_else(|| truncate(body, ERROR_BODY_LIMIT))
        .trim()
        .to_string();
    let message = if message.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    } else {
        message
    };

    debug!(status = %status, message = %message, "API returned non-success status");

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        ApiError::Unauthorized(message)
    } else {
        ApiError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

/// Pull a human-readable message out of a JSON error body.
///
/// Understands `{"detail": ..}`, `{"error": ..}`, `{"message": ..}` and
/// field-keyed validation errors such as `{"email": ["already taken"]}`.
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;

    for key in ["detail", "error", "message"] {
        if let Some(text) = object.get(key).and_then(serde_json::Value::as_str) {
            return Some(text.to_string());
        }
    }

    let field_errors: Vec<String> = object
        .iter()
        .filter_map(|(field, errors)| {
            let first = errors.as_array()?.first()?.as_str()?;
            Some(if field == "non_field_errors" {
                first.to_string()
            } else {
                format!("{field}: {first}")
            })
        })
        .collect();

    if field_errors.is_empty() {
        None
    } else {
        Some(field_errors.join("; "))
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// `Url::join` drops the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
