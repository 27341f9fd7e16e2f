pub mod password;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::JwtConfig;

pub use password::{hash_password, validate_password_strength, verify_password};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT secret")]
    InvalidSecret,
    #[error("Invalid JWT token: {0}")]
    Invalid(String),
}

/// A freshly signed token and the instant it stops being accepted.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies HS256 bearer tokens for one issuer.
pub struct JwtService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    lifetime: Duration,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Result<Self, JwtError> {
        if config.secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            lifetime: Duration::minutes(config.expire_minutes),
        })
    }

    pub fn issue(&self, user_id: i64) -> Result<IssuedToken, JwtError> {
        let now = Utc::now();
        let expires_at = now + self.lifetime;
        let claims = Claims {
            user_id,
            sub: user_id.to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))?;
        Ok(IssuedToken { token, expires_at })
    }

    /// Checks signature, algorithm, issuer and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| JwtError::Invalid(e.to_string()))?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str, issuer: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            issuer: issuer.to_string(),
            expire_minutes: 60,
        }
    }

    #[test]
    fn issued_token_verifies() {
        let jwt = JwtService::new(&config("s3cret", "bookstore-api")).unwrap();
        let issued = jwt.issue(42).unwrap();
        let claims = jwt.verify(&issued.token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.iss, "bookstore-api");
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn rejects_empty_secret() {
        assert!(matches!(
            JwtService::new(&config("", "bookstore-api")),
            Err(JwtError::InvalidSecret)
        ));
    }

    #[test]
    fn rejects_foreign_signature() {
        let ours = JwtService::new(&config("one", "bookstore-api")).unwrap();
        let theirs = JwtService::new(&config("two", "bookstore-api")).unwrap();
        let token = theirs.issue(1).unwrap().token;
        assert!(ours.verify(&token).is_err());
    }

    #[test]
    fn rejects_other_issuer() {
        let ours = JwtService::new(&config("same", "bookstore-api")).unwrap();
        let theirs = JwtService::new(&config("same", "someone-else")).unwrap();
        let token = theirs.issue(1).unwrap().token;
        assert!(ours.verify(&token).is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let jwt = JwtService::new(&config("s3cret", "bookstore-api")).unwrap();
        let past = Utc::now() - Duration::hours(2);
        let claims = Claims {
            user_id: 7,
            sub: "7".to_string(),
            iss: "bookstore-api".to_string(),
            iat: past.timestamp(),
            exp: (past + Duration::minutes(5)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"s3cret"),
        )
        .unwrap();
        assert!(jwt.verify(&token).is_err());
    }

    #[test]
    fn rejects_garbage() {
        let jwt = JwtService::new(&config("s3cret", "bookstore-api")).unwrap();
        assert!(jwt.verify("not.a.token").is_err());
    }
}
