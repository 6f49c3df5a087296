//! Signed credential codec
//!
//! Issues and verifies HS256 tokens carrying the subject's id, username, and
//! role set. Verification failures are deliberately indistinguishable to the
//! caller: bad signature, malformed token, and expiry all produce the same
//! generic `Unauthorized` so nothing about the token internals leaks.

use chrono::{DateTime, TimeZone, Utc};
use cinevault_core::models::{parse_roles, Role};
use cinevault_core::AppError;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

const VERIFY_FAILED: &str = "Could not validate credentials";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Username
    sub: String,
    /// User id
    uid: i64,
    /// Role names as issued
    roles: Vec<String>,
    /// Issued-at, seconds since epoch
    iat: i64,
    /// Expiry, seconds since epoch
    exp: i64,
}

/// A verified credential. Roles reflect the subject's grants at issue time
/// and are stale until the token is re-issued; account-disabled status is
/// re-checked live by the guard instead.
#[derive(Debug, Clone)]
pub struct Credential {
    pub user_id: i64,
    pub username: String,
    pub roles: Vec<Role>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Issues and verifies signed credentials.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_minutes: i64,
}

impl TokenCodec {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_minutes,
        }
    }

    /// Issue a token for the given subject with a computed expiry.
    pub fn issue(
        &self,
        user_id: i64,
        username: &str,
        roles: &[Role],
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_string(),
            uid: user_id,
            roles: roles.iter().map(|r| r.as_str().to_string()).collect(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::minutes(self.ttl_minutes)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify a token and recover the credential.
    ///
    /// Any failure maps to the same generic `Unauthorized`; expired tokens are
    /// rejected with zero leeway regardless of signature validity.
    pub fn verify(&self, token: &str) -> Result<Credential, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| AppError::Unauthorized(VERIFY_FAILED.to_string()))?;

        let claims = data.claims;
        let issued_at = Utc
            .timestamp_opt(claims.iat, 0)
            .single()
            .ok_or_else(|| AppError::Unauthorized(VERIFY_FAILED.to_string()))?;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| AppError::Unauthorized(VERIFY_FAILED.to_string()))?;

        Ok(Credential {
            user_id: claims.uid,
            username: claims.sub,
            roles: parse_roles(&claims.roles),
            issued_at,
            expires_at,
        })
    }
}
