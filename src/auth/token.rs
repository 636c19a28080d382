use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Minimum accepted length of the signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Lifetime of an issued token.
pub fn token_ttl() -> Duration {
    Duration::days(7)
}

/// Represents the claims encoded within a bearer token.
///
/// Only the user's identity is carried; the role is looked up again on every
/// request so a role change takes effect immediately.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// The user's id.
    pub sub: i32,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiration, seconds since epoch.
    pub exp: i64,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Issues and validates HS256 bearer tokens.
///
/// Built once at startup from the configured secret and shared read-only. A
/// secret that is absent or shorter than [`MIN_SECRET_LEN`] leaves the service
/// unconfigured: issuing fails with `AppError::Configuration` and nothing
/// validates.
pub struct TokenService {
    keys: Option<SigningKeys>,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: Option<&str>) -> Self {
        let keys = secret
            .filter(|s| s.len() >= MIN_SECRET_LEN)
            .map(|s| SigningKeys {
                encoding: EncodingKey::from_secret(s.as_bytes()),
                decoding: DecodingKey::from_secret(s.as_bytes()),
            });

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self { keys, validation }
    }

    pub fn is_configured(&self) -> bool {
        self.keys.is_some()
    }

    /// Fails with `AppError::Configuration` when no usable secret was provided.
    pub fn ensure_configured(&self) -> Result<(), AppError> {
        self.signing_keys().map(|_| ())
    }

    fn signing_keys(&self) -> Result<&SigningKeys, AppError> {
        self.keys.as_ref().ok_or_else(|| {
            AppError::Configuration(format!(
                "JWT_SECRET must be set and at least {} bytes long",
                MIN_SECRET_LEN
            ))
        })
    }

    /// Issues a token for `user_id`, valid for seven days from now.
    pub fn issue(&self, user_id: i32) -> Result<String, AppError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issues a token as if it had been created at `issued_at`.
    pub fn issue_at(&self, user_id: i32, issued_at: DateTime<Utc>) -> Result<String, AppError> {
        let keys = self.signing_keys()?;
        let claims = Claims {
            sub: user_id,
            iat: issued_at.timestamp(),
            exp: (issued_at + token_ttl()).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).map_err(|e| {
            error!("Failed to sign token for user {}: {}", user_id, e);
            AppError::InternalServerError("Failed to generate token".into())
        })
    }

    /// Returns the subject of a valid token, `None` otherwise.
    ///
    /// Malformed input, a foreign signature and expiry all collapse into `None`;
    /// the reason is only logged at debug level.
    pub fn validate(&self, token: &str) -> Option<i32> {
        let keys = self.keys.as_ref()?;
        match decode::<Claims>(token, &keys.decoding, &self.validation) {
            Ok(data) => Some(data.claims.sub),
            Err(e) => {
                debug!("Rejected bearer token: {:?}", e.kind());
                None
            }
        }
    }
}
