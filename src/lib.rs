//! AGCloud SDK - a client library for the AGCloud REST API.
//!
//! The interesting part of this crate is the session layer: a
//! [`SessionManager`] owns token acquisition, expiry tracking, and
//! proactive refresh against a token cache shared across processes.
//! Resource clients ([`resources`]) are thin wrappers that borrow the
//! manager, issue one HTTP call each, and hand back a normalized
//! [`Envelope`].
//!
//! ```no_run
//! use agcloud_sdk::{resources::Element, SessionManager};
//!
//! # async fn run() -> Result<(), agcloud_sdk::Error> {
//! let session = SessionManager::connect(Some("default")).await?;
//! let envelope = Element::new(&session).item(42).await?;
//! if envelope.status {
//!     println!("{:?}", envelope.data);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod resources;
pub mod session;

pub use api::{Envelope, ErrorInfo, Outcome};
pub use cache::{MemoryTokenCache, RedisTokenCache, TokenCache};
pub use config::ProfileConfig;
pub use error::{AuthStage, Error};
pub use session::{Agent, SessionManager, SessionOptions, Token};
