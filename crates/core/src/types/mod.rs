//! Core types for Girlz Love Tech.
//!
//! This module provides type-safe wrappers for the domain concepts the
//! remote services speak in.

pub mod account;
pub mod email;
pub mod id;
pub mod message;
pub mod price;
pub mod product;
pub mod sandbox;
pub mod status;

pub use account::{Dashboard, NewUser, OrderConfirmation, OrderLine, UserProfile};
pub use email::{Email, EmailError};
pub use id::*;
pub use message::{Badge, Message, Suggestion};
pub use price::Price;
pub use product::Product;
pub use sandbox::{SandboxDescriptor, SandboxUrls};
pub use status::*;
