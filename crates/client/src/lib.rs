//! Girlz Love Tech client library.
//!
//! This crate provides the client-side state core as a library so that the
//! CLI (and tests) can share it:
//!
//! - [`storage`] - durable key-value storage (JSON files or in-memory)
//! - [`api`] - typed HTTP client for the Girlz Love Tech services
//! - [`services`] - cart, catalog, conversation, session, shop and sandbox
//! - [`state`] - one cheaply cloneable object wiring all of the above

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod storage;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use state::ClientState;
