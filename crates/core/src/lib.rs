//! Girlz Love Tech Core - Shared domain types.
//!
//! This crate provides the types exchanged between the client library, the
//! command-line front end, and the remote Girlz Love Tech services:
//! - `client` - Cart, conversation, catalog and session state plus the HTTP client
//! - `cli` - Command-line front end over the client library
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - IDs, prices, emails, products, messages, badges, sandboxes and accounts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
