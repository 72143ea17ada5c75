use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;

/// Claims carried by every issued token. `roles` holds role ids; the
/// permission check resolves them against the permission matrix per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub name: String,
    pub roles: Vec<String>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, user_name: String, roles: Vec<String>) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        Self {
            sub: user_id,
            name: user_name,
            roles,
            iat: now.timestamp(),
            exp: (now + Duration::hours(expiry_hours as i64)).timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("{0}")]
    Token(String),

    #[error("password hash error: {0}")]
    Hash(String),
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }
    encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AuthError::Token(e.to_string()))
}

pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| AuthError::Token(format!("Invalid JWT token: {}", e)))
}

/// Argon2id hash in PHC string format.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn jwt_round_trip_preserves_claims() {
        let user_id = Uuid::new_v4();
        let claims = Claims {
            sub: user_id,
            name: "alice".to_string(),
            roles: vec!["Admin".to_string(), "Editor".to_string()],
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };

        let token = generate_jwt(&claims, SECRET).unwrap();
        let decoded = validate_jwt(&token, SECRET).unwrap();

        assert_eq!(decoded.sub, user_id);
        assert_eq!(decoded.name, "alice");
        assert_eq!(decoded.roles, vec!["Admin", "Editor"]);
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            name: "bob".to_string(),
            roles: vec![],
            iat: (Utc::now() - Duration::hours(2)).timestamp(),
            exp: (Utc::now() - Duration::hours(1)).timestamp(),
        };

        let token = generate_jwt(&claims, SECRET).unwrap();
        assert!(validate_jwt(&token, SECRET).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            name: "carol".to_string(),
            roles: vec![],
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };

        let token = generate_jwt(&claims, SECRET).unwrap();
        assert!(validate_jwt(&token, "other-secret").is_err());
    }

    #[test]
    fn empty_secret_fails_closed() {
        assert!(matches!(
            validate_jwt("whatever", ""),
            Err(AuthError::MissingSecret)
        ));
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("S3cret!pass").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("S3cret!pass", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("S3cret!pass", "not-a-phc-string"));
    }
}
