//! Verification token payload.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Claims carried by a verification token.
///
/// The schema is strict: tokens whose payload carries unknown fields, lacks a
/// field, or holds a non-UUID `jti` are rejected before any identity check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct VerificationClaims {
    /// Bound identity (the Discord user id).
    pub uid: String,

    /// Unique token identifier, kept for audit.
    pub jti: Uuid,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

impl VerificationClaims {
    /// Creates claims for `uid` issued now and expiring after `ttl`.
    ///
    /// The `jti` is a v4 UUID drawn from the operating system CSPRNG.
    #[must_use]
    pub fn new(uid: impl Into<String>, ttl: Duration) -> Self {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        Self::issued_at(uid, now, ttl)
    }

    /// Creates claims for `uid` issued at the given Unix timestamp.
    #[must_use]
    pub fn issued_at(uid: impl Into<String>, iat: i64, ttl: Duration) -> Self {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            uid: uid.into(),
            jti: Uuid::new_v4(),
            iat,
            exp: iat.saturating_add(ttl_secs),
        }
    }

    /// Returns `true` if the claims are expired at `now` (Unix seconds).
    ///
    /// A token is expired from the second its `exp` is reached.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp <= now
    }

    /// Returns `true` if the claims are expired now.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc().unix_timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_claims_use_ttl() {
        let claims = VerificationClaims::issued_at("12345", 1_700_000_000, Duration::from_secs(60));
        assert_eq!(claims.uid, "12345");
        assert_eq!(claims.iat, 1_700_000_000);
        assert_eq!(claims.exp, 1_700_000_060);
        assert_eq!(claims.jti.get_version_num(), 4);
    }

    #[test]
    fn test_jti_is_unique() {
        let a = VerificationClaims::new("u", Duration::from_secs(60));
        let b = VerificationClaims::new("u", Duration::from_secs(60));
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_expiry_boundary() {
        let claims = VerificationClaims::issued_at("u", 100, Duration::from_secs(10));
        assert!(!claims.is_expired_at(109));
        assert!(claims.is_expired_at(110));
        assert!(claims.is_expired_at(111));
    }

    #[test]
    fn test_zero_ttl_is_expired_immediately() {
        let claims = VerificationClaims::new("u", Duration::ZERO);
        assert!(claims.is_expired());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let json = r#"{"uid":"1","jti":"6f1c8a2e-3b1d-4c55-9a0e-2f0f6d0b9a11","iat":1,"exp":2,"service":"x"}"#;
        assert!(serde_json::from_str::<VerificationClaims>(json).is_err());
    }

    #[test]
    fn test_non_uuid_jti_rejected() {
        let json = r#"{"uid":"1","jti":"not-a-uuid","iat":1,"exp":2}"#;
        assert!(serde_json::from_str::<VerificationClaims>(json).is_err());
    }

    #[test]
    fn test_missing_uid_rejected() {
        let json = r#"{"jti":"6f1c8a2e-3b1d-4c55-9a0e-2f0f6d0b9a11","iat":1,"exp":2}"#;
        assert!(serde_json::from_str::<VerificationClaims>(json).is_err());
    }
}
