//! Session and token lifecycle management.
//!
//! This module provides:
//! - `SessionManager`: token acquisition, expiry tracking, and
//!   proactive refresh against the shared token cache
//! - `Agent`: an ephemeral HTTP client carrying the current token in
//!   its default headers
//!
//! One `SessionManager` is constructed per profile and injected into
//! the resource clients that need it.

pub mod manager;
pub mod token;

pub use manager::{Agent, SessionManager, SessionOptions};
pub use token::Token;
