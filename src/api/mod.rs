//! Response handling shared by every resource client.
//!
//! Raw HTTP responses are folded into a uniform [`Envelope`] so that
//! resource callers always pattern-match on one shape instead of
//! juggling status codes, parse failures, and error bodies themselves.

pub mod envelope;

pub use envelope::{normalize, Envelope, ErrorInfo, Outcome};
