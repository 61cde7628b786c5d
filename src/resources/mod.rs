//! Thin resource clients over the REST API.
//!
//! Every method follows the same mechanical pattern: build a path from
//! its inputs, obtain an agent from the session manager, issue one
//! request, and normalize the response into an
//! [`Envelope`](crate::api::Envelope). No retries, no payload
//! validation, no routing - that all belongs to the caller.

pub mod element;
pub mod h2o;

pub use element::Element;
pub use h2o::H2o;
