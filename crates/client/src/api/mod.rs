//! Typed client for the Girlz Love Tech HTTP services.
//!
//! # Architecture
//!
//! - Plain HTTPS/JSON over `reqwest`; every call is a single request
//! - Bearer access tokens are passed per call, never stored in the client
//! - The services the state core depends on are expressed as traits
//!   ([`AuthApi`], [`ChatGateway`], [`ShopApi`], [`SandboxApi`]) so they can be
//!   swapped for in-process fakes
//!
//! # Example
//!
//! ```rust,ignore
//! use glt_client::api::{ApiClient, AuthApi, ChatGateway};
//!
//! let client = ApiClient::new(&config)?;
//! let tokens = client.login("ada@example.org", "hunter22").await?;
//! let reply = client.send_message(&tokens.access, "show me robot kits").await?;
//! ```

mod client;
pub mod types;

pub use client::ApiClient;
pub use types::{ChatReply, LoginTokens, RefreshedAccess, SandboxAction};

use std::future::Future;

use glt_core::{OrderConfirmation, OrderLine, Product, SandboxDescriptor};
use thiserror::Error;

/// Endpoint paths, relative to the configured API base URL.
pub mod endpoints {
    pub const LOGIN: &str = "api/auth/login/";
    pub const REGISTER: &str = "api/auth/register/";
    pub const TOKEN_REFRESH: &str = "api/auth/token/refresh/";
    pub const TOKEN_BLACKLIST: &str = "api/auth/token/blacklist/";
    pub const CHAT_MESSAGE: &str = "api/chatbot/message/";
    pub const PRODUCTS: &str = "api/products/";
    pub const PLACE_ORDER: &str = "api/orders/place/";
    pub const SCHOOLS: &str = "api/schools/";
    pub const USER: &str = "api/user";
    pub const DASHBOARD: &str = "api/user/dashboard";
    pub const SANDBOX: &str = "api/sandbox";
}

/// Errors that can occur when calling the remote services.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// No access token is available for an authenticated call.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The server rejected the credentials or token (401/403).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The server returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Text suitable for showing to the user.
    ///
    /// Server-provided messages are passed through; transport details are not.
    #[must_use]
    pub fn server_message(&self) -> String {
        match self {
            Self::Unauthorized(message) | Self::Api { message, .. } => message.clone(),
            Self::NotAuthenticated => "Not authenticated".to_string(),
            Self::Http(_) | Self::Parse(_) | Self::Url(_) => {
                "Request failed, please try again".to_string()
            }
        }
    }

    /// Whether this error means the current credentials are missing or rejected.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::NotAuthenticated | Self::Unauthorized(_))
    }
}

/// Authentication endpoints used by the session store.
pub trait AuthApi: Send + Sync + 'static {
    /// Exchange credentials for an access/refresh token pair.
    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<LoginTokens, ApiError>> + Send;

    /// Exchange a refresh token for a new access token.
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<RefreshedAccess, ApiError>> + Send;

    /// Invalidate a refresh token server-side.
    fn blacklist(&self, refresh_token: &str) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// The remote chatbot endpoint.
pub trait ChatGateway: Send + Sync + 'static {
    /// Send one user message and receive the assistant's structured reply.
    fn send_message(
        &self,
        access_token: &str,
        message: &str,
    ) -> impl Future<Output = Result<ChatReply, ApiError>> + Send;
}

/// Product listing and order placement.
pub trait ShopApi: Send + Sync + 'static {
    fn products(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send;

    fn place_order(
        &self,
        access_token: &str,
        lines: &[OrderLine],
    ) -> impl Future<Output = Result<OrderConfirmation, ApiError>> + Send;
}

/// Sandbox lifecycle endpoints.
pub trait SandboxApi: Send + Sync + 'static {
    /// Fetch the current sandbox descriptor.
    fn sandbox_status(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<SandboxDescriptor, ApiError>> + Send;

    /// Ask the orchestrator to perform a lifecycle action.
    fn sandbox_action(
        &self,
        access_token: &str,
        action: SandboxAction,
    ) -> impl Future<Output = Result<SandboxDescriptor, ApiError>> + Send;
}
