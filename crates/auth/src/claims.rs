use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Session credential payload.
///
/// Only proves *which* identity is asking. Role and employment status are
/// always re-read from the identity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub email: String,

    /// Issued-at, seconds since the epoch.
    pub iat: i64,

    /// Expiration, seconds since the epoch.
    pub exp: i64,
}

impl SessionClaims {
    pub fn new(email: impl Into<String>, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            email: email.into(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("token carries no email")]
    MissingSubject,
}

/// Deterministically validate decoded claims against `now`.
///
/// Signature verification happens in [`crate::TokenService`] before this runs.
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.email.trim().is_empty() {
        return Err(TokenValidationError::MissingSubject);
    }
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    let now = now.timestamp();
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn accepts_inside_window() {
        let claims = SessionClaims::new("a@workify.io", t0(), Duration::hours(2));
        assert_eq!(validate_claims(&claims, t0() + Duration::minutes(119)), Ok(()));
    }

    #[test]
    fn rejects_at_expiry() {
        let claims = SessionClaims::new("a@workify.io", t0(), Duration::hours(2));
        assert_eq!(
            validate_claims(&claims, t0() + Duration::hours(2)),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn rejects_future_issue() {
        let claims = SessionClaims::new("a@workify.io", t0(), Duration::hours(2));
        assert_eq!(
            validate_claims(&claims, t0() - Duration::seconds(5)),
            Err(TokenValidationError::NotYetValid)
        );
    }

    #[test]
    fn rejects_inverted_window_and_blank_email() {
        let mut claims = SessionClaims::new("a@workify.io", t0(), Duration::hours(2));
        claims.exp = claims.iat;
        assert_eq!(validate_claims(&claims, t0()), Err(TokenValidationError::InvalidTimeWindow));

        let blank = SessionClaims::new("  ", t0(), Duration::hours(2));
        assert_eq!(validate_claims(&blank, t0()), Err(TokenValidationError::MissingSubject));
    }
}
