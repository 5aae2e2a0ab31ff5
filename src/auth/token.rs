use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, AuthError};

/// Wire form of the session token payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // User ID
    pub username: String,
    pub iat: i64,     // Issued at
    pub exp: i64,     // Expiration time
}

/// Verified session, as handed to the rest of the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub user_id: i64,
    pub username: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies HS256 session tokens under one process-wide secret.
/// Rotating the secret invalidates every outstanding token.
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager").finish_non_exhaustive()
    }
}

impl TokenManager {
    pub fn new(secret: &str) -> Result<Self, AppError> {
        if secret.trim().is_empty() {
            return Err(AppError::ConfigError("token signing secret is empty".into()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    pub fn issue(&self, user_id: i64, username: &str, ttl: Duration) -> Result<String, AppError> {
        self.issue_at(user_id, username, ttl, Utc::now())
    }

    pub(crate) fn issue_at(
        &self,
        user_id: i64,
        username: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            iat,
            exp: iat + ttl.num_seconds(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(format!("token signing failed: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Every failure collapses to `InvalidToken`; the reason is only logged.
    pub(crate) fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!("Token rejected: {}", e);
                AuthError::InvalidToken
            })?
            .claims;

        if now.timestamp() >= claims.exp {
            debug!("Token rejected: expired");
            return Err(AuthError::InvalidToken);
        }

        let user_id = claims.sub.parse::<i64>().map_err(|_| AuthError::InvalidToken)?;
        let issued_at = Utc.timestamp_opt(claims.iat, 0).single().ok_or(AuthError::InvalidToken)?;
        let expires_at = Utc.timestamp_opt(claims.exp, 0).single().ok_or(AuthError::InvalidToken)?;

        Ok(SessionClaims {
            user_id,
            username: claims.username,
            issued_at,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> TokenManager {
        TokenManager::new("test_secret").unwrap()
    }

    #[test]
    fn test_issue_then_verify() {
        let tm = manager();
        let ttl = Duration::hours(1);
        let token = tm.issue(1, "alice", ttl).unwrap();

        let claims = tm.verify(&token).unwrap();
        assert_eq!(claims.user_id, 1);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.expires_at, claims.issued_at + ttl);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tm = manager();
        let issued = Utc::now() - Duration::hours(2);
        let token = tm.issue_at(1, "alice", Duration::hours(1), issued).unwrap();

        assert_eq!(tm.verify(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_no_grace_period_at_expiry() {
        let tm = manager();
        let now = Utc::now();
        let token = tm.issue_at(1, "alice", Duration::seconds(60), now).unwrap();

        let claims = tm.verify_at(&token, now + Duration::seconds(59)).unwrap();
        assert_eq!(claims.user_id, 1);
        assert_eq!(
            tm.verify_at(&token, claims.expires_at),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_zero_ttl_is_never_valid() {
        let tm = manager();
        let token = tm.issue(1, "alice", Duration::zero()).unwrap();
        assert_eq!(tm.verify(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = manager().issue(1, "alice", Duration::hours(1)).unwrap();
        let other = TokenManager::new("rotated_secret").unwrap();

        assert_eq!(other.verify(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let tm = manager();
        let token = tm.issue(1, "alice", Duration::hours(1)).unwrap();
        let forged_payload = tm.issue(2, "mallory", Duration::hours(1)).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged_payload.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        assert_eq!(tm.verify(&spliced), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let tm = manager();
        for token in ["", "invalid_token", "a.b.c", "Bearer x.y.z"] {
            assert_eq!(tm.verify(token), Err(AuthError::InvalidToken), "token {token:?}");
        }
    }

    #[test]
    fn test_empty_secret_is_a_config_error() {
        assert!(matches!(TokenManager::new(""), Err(AppError::ConfigError(_))));
        assert!(matches!(TokenManager::new("  \t"), Err(AppError::ConfigError(_))));
    }
}
