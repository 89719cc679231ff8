//! Request and response bodies for the remote services.

use glt_core::message::suggestion_map;
use glt_core::{Badge, OrderLine, Product, Suggestion};
use serde::{Deserialize, Deserializer, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(super) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Token pair returned by a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginTokens {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub(super) struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// New access token returned by the refresh endpoint.
///
/// Some deployments rotate refresh tokens as well; the rotated token is
/// ignored and only the access half of the stored pair is replaced.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshedAccess {
    pub access: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(super) struct ChatRequest<'a> {
    pub message: &'a str,
}

/// Structured reply from the chatbot endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    /// Assistant text.
    pub response: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub products: Vec<Product>,
    #[serde(default, with = "suggestion_map")]
    pub suggestions: Vec<Suggestion>,
    #[serde(default, alias = "badgesEarned", deserialize_with = "null_as_empty")]
    pub badges_earned: Vec<Badge>,
}

impl ChatReply {
    /// A plain text reply with no structured payloads.
    #[must_use]
    pub fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            ..Self::default()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shop
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(super) struct PlaceOrderRequest<'a> {
    pub products: &'a [OrderLine],
}

#[derive(Debug, Deserialize)]
pub(super) struct SchoolsResponse {
    #[serde(default)]
    pub schools: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Sandbox
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle actions the sandbox orchestrator accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SandboxAction {
    Create,
    Pause,
    Resume,
    Reset,
    Delete,
}

impl SandboxAction {
    /// Path segment appended to the sandbox endpoint.
    #[must_use]
    pub const fn segment(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Reset => "reset",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for SandboxAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.segment())
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use glt_core::{Price, ProductId};

    use super::*;

    #[test]
    fn test_chat_reply_text_only() {
        let reply: ChatReply = serde_json::from_str(r#"{"response": "Hi there!"}"#).unwrap();
        assert_eq!(reply, ChatReply::text("Hi there!"));
    }

    #[test]
    fn test_chat_reply_with_payloads() {
        let reply: ChatReply = serde_json::from_str(
            r#"{
                "response": "Here are some kits",
                "products": [{"id": 9, "title": "Robot Kit", "price": "79.00"}],
                "suggestions": {"Cheaper": "anything under $20?", "Add to cart": "add the robot kit"},
                "badgesEarned": [{"name": "Curious Mind"}]
            }"#,
        )
        .unwrap();

        assert_eq!(reply.products.len(), 1);
        assert_eq!(reply.products[0].id, ProductId::new(9));
        assert_eq!(reply.products[0].price, Price::from_cents(7900));
        assert_eq!(reply.suggestions[0].label, "Cheaper");
        assert_eq!(reply.badges_earned[0].name, "Curious Mind");
    }

    #[test]
    fn test_chat_reply_null_payloads() {
        let reply: ChatReply = serde_json::from_str(
            r#"{"response": "ok", "products": null, "suggestions": null, "badges_earned": null}"#,
        )
        .unwrap();
        assert!(reply.products.is_empty());
        assert!(reply.suggestions.is_empty());
        assert!(reply.badges_earned.is_empty());
    }

    #[test]
    fn test_place_order_request_shape() {
        let lines = [OrderLine {
            product_id: ProductId::new(5),
            quantity: 2,
        }];
        let body = serde_json::to_string(&PlaceOrderRequest { products: &lines }).unwrap();
        assert_eq!(body, r#"{"products":[{"product_id":5,"quantity":2}]}"#);
    }

    #[test]
    fn test_sandbox_action_segments() {
        assert_eq!(SandboxAction::Create.segment(), "create");
        assert_eq!(SandboxAction::Delete.to_string(), "delete");
    }
}
