//! Account, dashboard and order payloads.
//!
//! These mirror what the user and order services return. Unknown fields are
//! ignored so the services can grow without breaking the client.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

use super::email::Email;
use super::id::{OrderId, ProductId, UserId};
use super::message::Badge;
use super::price::Price;

/// Registration request for a new student account.
///
/// The password is only exposed when the request is serialized.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub email: Email,
    pub name: String,
    pub grade: String,
    pub school: String,
    #[serde(serialize_with = "expose_password")]
    pub password: SecretString,
}

fn expose_password<S: Serializer>(password: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(password.expose_secret())
}

/// The logged-in user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub school: Option<String>,
}

/// Aggregated dashboard data for the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dashboard {
    #[serde(default)]
    pub badges: Vec<Badge>,
    #[serde(default)]
    pub orders: Vec<OrderConfirmation>,
    #[serde(default)]
    pub chat_count: u64,
}

impl Dashboard {
    /// Badges the user has actually earned.
    pub fn earned_badges(&self) -> impl Iterator<Item = &Badge> {
        self.badges.iter().filter(|badge| badge.is_earned())
    }
}

/// One line of an order request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Confirmation returned after placing an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    #[serde(alias = "order_id")]
    pub id: OrderId,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total: Option<Price>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "products")]
    pub items: Vec<OrderLine>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_confirmation_accepts_order_id_alias() {
        let confirmation: OrderConfirmation = serde_json::from_str(
            r#"{"order_id": 88, "status": "placed", "total": "12.50",
                "products": [{"product_id": 3, "quantity": 2}]}"#,
        )
        .unwrap();
        assert_eq!(confirmation.id, OrderId::new(88));
        assert_eq!(confirmation.total, Some(Price::from_cents(1250)));
        assert_eq!(confirmation.items.len(), 1);
    }

    #[test]
    fn test_dashboard_filters_earned_badges() {
        let dashboard: Dashboard = serde_json::from_str(
            r#"{"badges": [
                {"name": "Explorer", "earned_at": "2026-01-02T03:04:05Z"},
                {"name": "Shopper"}
            ]}"#,
        )
        .unwrap();
        let earned: Vec<_> = dashboard.earned_badges().map(|b| b.name.as_str()).collect();
        assert_eq!(earned, ["Explorer"]);
        assert_eq!(dashboard.chat_count, 0);
    }

    #[test]
    fn test_new_user_serializes_email_as_string() {
        let user = NewUser {
            email: Email::parse("ada@example.org").unwrap(),
            name: "Ada".to_string(),
            grade: "10".to_string(),
            school: "Lovelace High".to_string(),
            password: SecretString::from("correct horse"),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["email"], "ada@example.org");
        assert_eq!(json["school"], "Lovelace High");
        assert_eq!(json["password"], "correct horse");
    }

    #[test]
    fn test_new_user_debug_hides_password() {
        let user = NewUser {
            email: Email::parse("ada@example.org").unwrap(),
            name: "Ada".to_string(),
            grade: "10".to_string(),
            school: "Lovelace High".to_string(),
            password: SecretString::from("correct horse"),
        };
        let debug = format!("{user:?}");
        assert!(!debug.contains("correct horse"));
        assert!(debug.contains("ada@example.org"));
    }
}
