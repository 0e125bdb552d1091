//! JWT token service
//!
//! Tokens carry the identity as a tagged variant, mirroring
//! [`Identity`]: a `kind` discriminator distinguishes the built-in
//! operator from persisted accounts.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use thiserror::Error;

use super::identity::{Identity, Role};

/// JWT errors
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Token generation failed: {0}")]
    GenerationFailed(String),
}

/// Token subject, tagged by identity kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TokenSubject {
    BuiltinAdmin,
    Account { id: String, name: String, role: Role },
}

/// Claims stored in the token
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    subject: TokenSubject,
    exp: i64,
    iat: i64,
}

/// Signs and verifies access tokens.
pub struct JwtService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiration_minutes: i64,
}

impl JwtService {
    pub fn new(secret: &str, expiration_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiration_minutes,
        }
    }

    /// Issue a token for the given identity.
    pub fn issue(&self, identity: &Identity) -> Result<String, JwtError> {
        let now = Utc::now();
        let subject = match identity {
            Identity::BuiltinAdmin => TokenSubject::BuiltinAdmin,
            Identity::Account { id, name, role } => TokenSubject::Account {
                id: id.to_string(),
                name: name.clone(),
                role: *role,
            },
        };
        let claims = Claims {
            subject,
            exp: (now + Duration::minutes(self.expiration_minutes)).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// Verify a token and resolve its identity.
    pub fn verify(&self, token: &str) -> Result<Identity, JwtError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                _ => JwtError::InvalidToken(e.to_string()),
            },
        )?;

        match data.claims.subject {
            TokenSubject::BuiltinAdmin => Ok(Identity::BuiltinAdmin),
            TokenSubject::Account { id, name, role } => {
                let id: RecordId = id
                    .parse()
                    .map_err(|_| JwtError::InvalidToken(format!("malformed account id: {id}")))?;
                Ok(Identity::Account { id, name, role })
            }
        }
    }

    /// Extract the bearer token from an Authorization header value.
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ")
    }
}
