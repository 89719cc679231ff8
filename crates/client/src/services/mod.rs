//! Client-side state services.
//!
//! Each service is a cheaply cloneable handle over shared state. Services that
//! talk to the network are generic over the API trait they need, so tests can
//! substitute in-process fakes for [`ApiClient`](crate::api::ApiClient).

pub mod account;
pub mod cart;
pub mod catalog;
pub mod chat;
pub mod sandbox;
pub mod session;
pub mod shop;
pub mod tokens;

pub use account::{AccountService, Registration};
pub use cart::{CartItems, CartStore};
pub use catalog::ProductCatalog;
pub use chat::{ChatService, FALLBACK_REPLY};
pub use sandbox::SandboxService;
pub use session::Session;
pub use shop::ShopService;
pub use tokens::{AuthTokens, TokenStore};
