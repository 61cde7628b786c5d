//! Access token representation and cache field mapping.

use std::collections::HashMap;

use chrono::Utc;
use serde::Deserialize;

/// Hash field holding the token value in the cache
pub(crate) const FIELD_ACCESS_TOKEN: &str = "access_token";

/// Payload returned by the auth endpoint for both create and refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPayload {
    pub access_token: String,
    pub expires_in: i64,
}

/// The current access token together with its local expiry estimate.
///
/// `expires_at` already has the safety margin subtracted, so the cache
/// entry always disappears slightly before the remote token would be
/// rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    /// Absolute epoch seconds
    pub expires_at: i64,
}

impl Token {
    /// Build a token from an auth endpoint payload, anchoring the
    /// relative `expires_in` to the local clock minus the margin.
    pub fn from_payload(payload: TokenPayload, margin_seconds: i64) -> Self {
        Self {
            access_token: payload.access_token,
            expires_at: Utc::now().timestamp() + payload.expires_in - margin_seconds,
        }
    }

    /// Cache hash fields for this token.
    pub fn to_fields(&self) -> HashMap<String, String> {
        HashMap::from([(FIELD_ACCESS_TOKEN.to_string(), self.access_token.clone())])
    }

    /// Rebuild a token from cache fields plus the remaining TTL the
    /// cache reported. Returns `None` when the token field is missing.
    pub fn from_fields(fields: &HashMap<String, String>, ttl_seconds: i64) -> Option<Self> {
        let access_token = fields.get(FIELD_ACCESS_TOKEN)?.clone();
        Some(Self {
            access_token,
            expires_at: Utc::now().timestamp() + ttl_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_payload_subtracts_margin() {
        let before = Utc::now().timestamp();
        let token = Token::from_payload(
            TokenPayload {
                access_token: "tok".to_string(),
                expires_in: 3600,
            },
            10,
        );
        let after = Utc::now().timestamp();
        assert!(token.expires_at >= before + 3590);
        assert!(token.expires_at <= after + 3590);
    }

    #[test]
    fn test_field_round_trip() {
        let token = Token {
            access_token: "tok".to_string(),
            expires_at: Utc::now().timestamp() + 100,
        };
        let rebuilt = Token::from_fields(&token.to_fields(), 100).unwrap();
        assert_eq!(rebuilt.access_token, "tok");
    }

    #[test]
    fn test_from_fields_missing_token() {
        assert!(Token::from_fields(&HashMap::new(), 100).is_none());
    }
}
