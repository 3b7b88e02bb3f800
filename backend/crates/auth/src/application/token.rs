//! Access Tokens
//!
//! Compact JWS (`header.payload.signature`, HS256) carrying the user id and
//! role. Verification rejects any other algorithm.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use kernel::id::UserId;
use platform::crypto::{from_base64url, hmac_sha256, to_base64url, verify_hmac_sha256};
use serde::{Deserialize, Serialize};

use crate::application::config::AuthConfig;
use crate::domain::value_object::Role;
use crate::error::{AuthError, AuthResult};

const HEADER_JSON: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Deserialize)]
struct Header {
    alg: String,
}

/// A freshly signed access token.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TokenService {
    secret: Arc<[u8]>,
    ttl: chrono::Duration,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            secret: Arc::from(config.jwt_secret.as_slice()),
            ttl: config.access_ttl_chrono(),
        }
    }

    pub fn issue(&self, user_id: UserId, role: Role, now: DateTime<Utc>) -> AuthResult<AccessToken> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Internal("access token lifetime out of range".into()))?;
        let claims = Claims {
            sub: user_id,
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let payload =
            serde_json::to_vec(&claims).map_err(|e| AuthError::Internal(e.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            to_base64url(HEADER_JSON.as_bytes()),
            to_base64url(&payload)
        );
        let signature = hmac_sha256(&self.secret, signing_input.as_bytes());

        Ok(AccessToken {
            token: format!("{}.{}", signing_input, to_base64url(&signature)),
            expires_at: Utc
                .timestamp_opt(claims.exp, 0)
                .single()
                .unwrap_or(expires_at),
        })
    }

    /// Check structure, algorithm, signature and expiry, in that order.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> AuthResult<Claims> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::InvalidToken);
        };

        let header: Header = decode_segment(header_b64)?;
        if header.alg != "HS256" {
            return Err(AuthError::InvalidToken);
        }

        let signature = from_base64url(signature_b64).map_err(|_| AuthError::InvalidToken)?;
        let signing_input = format!("{header_b64}.{payload_b64}");
        if !verify_hmac_sha256(&self.secret, signing_input.as_bytes(), &signature) {
            return Err(AuthError::InvalidToken);
        }

        let claims: Claims = decode_segment(payload_b64)?;
        if now.timestamp() >= claims.exp {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> AuthResult<T> {
    let bytes = from_base64url(segment).map_err(|_| AuthError::InvalidToken)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn service() -> TokenService {
        TokenService::new(&AuthConfig {
            jwt_secret: b"test-secret-test-secret-test-sec".to_vec(),
            ..Default::default()
        })
    }

    #[test]
    fn test_lifetime_out_of_range_is_an_error() {
        let svc = TokenService::new(&AuthConfig {
            jwt_secret: b"test-secret-test-secret-test-sec".to_vec(),
            access_ttl: std::time::Duration::from_secs(u64::MAX),
            ..Default::default()
        });
        assert!(matches!(
            svc.issue(UserId::new(), Role::Customer, Utc::now()),
            Err(AuthError::Internal(_))
        ));
    }

    #[test]
    fn test_issue_and_verify() {
        let svc = service();
        let now = Utc::now();
        let user_id = UserId::new();
        let issued = svc.issue(user_id, Role::Vendor, now).unwrap();

        assert_eq!(issued.token.split('.').count(), 3);
        let claims = svc.verify(&issued.token, now).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, Role::Vendor);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn test_expired_token() {
        let svc = service();
        let now = Utc::now();
        let issued = svc.issue(UserId::new(), Role::Customer, now).unwrap();
        let err = svc.verify(&issued.token, now + Duration::minutes(15)).unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[test]
    fn test_tampered_and_foreign_tokens() {
        let svc = service();
        let now = Utc::now();
        let issued = svc.issue(UserId::new(), Role::Customer, now).unwrap();

        // Swap the payload for one claiming admin.
        let parts: Vec<&str> = issued.token.split('.').collect();
        let forged_claims = format!(
            r#"{{"sub":"{}","role":"admin","iat":0,"exp":{}}}"#,
            UserId::new(),
            now.timestamp() + 600
        );
        let forged = format!("{}.{}.{}", parts[0], to_base64url(forged_claims.as_bytes()), parts[2]);
        assert!(matches!(svc.verify(&forged, now), Err(AuthError::InvalidToken)));

        let other = TokenService::new(&AuthConfig::with_random_secret());
        assert!(matches!(other.verify(&issued.token, now), Err(AuthError::InvalidToken)));

        for junk in ["", "abc", "a.b", "a.b.c.d", "x.y.z"] {
            assert!(matches!(svc.verify(junk, now), Err(AuthError::InvalidToken)), "{junk}");
        }
    }

    #[test]
    fn test_rejects_alg_none() {
        let svc = service();
        let now = Utc::now();
        let header = to_base64url(br#"{"alg":"none","typ":"JWT"}"#);
        let claims = format!(
            r#"{{"sub":"{}","role":"admin","iat":0,"exp":{}}}"#,
            UserId::new(),
            now.timestamp() + 600
        );
        let token = format!("{}.{}.", header, to_base64url(claims.as_bytes()));
        assert!(matches!(svc.verify(&token, now), Err(AuthError::InvalidToken)));
    }
}
