//! Conversation messages and the structured payloads they carry.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::id::MessageId;
use super::product::Product;
use super::status::Sender;

/// A single entry in the conversation log.
///
/// Messages are immutable once created; the log only ever appends them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub sender: Sender,
    pub sent_at: DateTime<Utc>,
    /// For assistant messages, the user message this one answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<MessageId>,
    /// Quick-reply buttons, in the order the assistant sent them.
    #[serde(default, with = "suggestion_map", skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<Suggestion>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub products: Vec<Product>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub badges_earned: Vec<Badge>,
}

impl Message {
    /// Create a user-authored message stamped with the current time.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text.into(), Sender::User, None)
    }

    /// Create an assistant message answering `in_reply_to`.
    #[must_use]
    pub fn assistant(text: impl Into<String>, in_reply_to: MessageId) -> Self {
        Self::new(text.into(), Sender::Assistant, Some(in_reply_to))
    }

    fn new(text: String, sender: Sender, in_reply_to: Option<MessageId>) -> Self {
        Self {
            id: MessageId::generate(),
            text,
            sender,
            sent_at: Utc::now(),
            in_reply_to,
            suggestions: Vec::new(),
            products: Vec::new(),
            badges_earned: Vec::new(),
        }
    }

    /// Attach quick-reply suggestions.
    #[must_use]
    pub fn with_suggestions(mut self, suggestions: Vec<Suggestion>) -> Self {
        self.suggestions = suggestions;
        self
    }

    /// Attach product cards.
    #[must_use]
    pub fn with_products(mut self, products: Vec<Product>) -> Self {
        self.products = products;
        self
    }

    /// Attach badges earned by the exchange.
    #[must_use]
    pub fn with_badges(mut self, badges: Vec<Badge>) -> Self {
        self.badges_earned = badges;
        self
    }

    /// Send time formatted for display, e.g. `14:05`.
    #[must_use]
    pub fn display_time(&self) -> String {
        self.sent_at.format("%H:%M").to_string()
    }

    #[must_use]
    pub fn is_from_user(&self) -> bool {
        self.sender == Sender::User
    }
}

/// A quick-reply button: the label shown and the text sent when chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub label: String,
    pub reply: String,
}

impl Suggestion {
    #[must_use]
    pub fn new(label: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            reply: reply.into(),
        }
    }
}

/// An achievement badge, as reported by the dashboard or a chat reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "icon_url", alias = "icon_ref")]
    pub icon: Option<String>,
    /// Present only once the badge has been earned.
    #[serde(default)]
    pub earned_at: Option<DateTime<Utc>>,
}

impl Badge {
    #[must_use]
    pub const fn is_earned(&self) -> bool {
        self.earned_at.is_some()
    }
}

/// Serde adapter for suggestions sent as a JSON object of `label: reply`.
///
/// The object is read entry by entry so the assistant's ordering survives,
/// independent of how `serde_json` orders its own maps.
pub mod suggestion_map {
    use super::{
        Deserializer, MapAccess, SerializeMap, Serializer, Suggestion, Visitor, fmt,
    };

    /// Serialize suggestions as an ordered JSON object.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error if writing the map fails.
    pub fn serialize<S: Serializer>(
        suggestions: &[Suggestion],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(suggestions.len()))?;
        for suggestion in suggestions {
            map.serialize_entry(&suggestion.label, &suggestion.reply)?;
        }
        map.end()
    }

    /// Deserialize suggestions from a JSON object, keeping entry order.
    ///
    /// `null` yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns the deserializer's error if the input is not an object of strings.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Suggestion>, D::Error> {
        deserializer.deserialize_option(OptionalMapVisitor)
    }

    struct OptionalMapVisitor;

    impl<'de> Visitor<'de> for OptionalMapVisitor {
        type Value = Vec<Suggestion>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an object mapping suggestion labels to reply text")
        }

        fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
            deserializer.deserialize_map(self)
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut suggestions = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((label, reply)) = access.next_entry::<String, String>()? {
                suggestions.push(Suggestion { label, reply });
            }
            Ok(suggestions)
        }
    }
}
