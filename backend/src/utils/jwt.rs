//! JWT token utilities for authentication and authorization.
//!
//! Provides token creation and validation for the access/refresh pair that
//! represents a session. Each token kind is signed with its own secret, so a
//! refresh token can never be replayed as an access token or vice versa.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::errors::ServiceError;

/// JWT Claims structure carried by both token kinds
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Token expiration timestamp
    pub exp: usize,
    /// Token issued at timestamp
    pub iat: usize,
}

impl Claims {
    pub fn user_id(&self) -> &str {
        &self.sub
    }
}

/// JWT token utility for creating and validating the session token pair
pub struct JwtUtils {
    access_encoding_key: EncodingKey,
    access_decoding_key: DecodingKey,
    refresh_encoding_key: EncodingKey,
    refresh_decoding_key: DecodingKey,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
    validation: Validation,
}

impl JwtUtils {
    /// Create a new JwtUtils instance with secrets from the environment
    pub fn new() -> Result<Self, ServiceError> {
        let config = Config::from_env()
            .map_err(|e| ServiceError::internal_error(format!("Config error: {e}")))?;

        Ok(Self::from_config(&config))
    }

    /// Create a JwtUtils instance from an already-loaded configuration
    pub fn from_config(config: &Config) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        JwtUtils {
            access_encoding_key: EncodingKey::from_secret(config.access_token_secret.as_bytes()),
            access_decoding_key: DecodingKey::from_secret(config.access_token_secret.as_bytes()),
            refresh_encoding_key: EncodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            refresh_decoding_key: DecodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            access_ttl_seconds: config.access_token_ttl_seconds,
            refresh_ttl_seconds: config.refresh_token_ttl_seconds,
            validation,
        }
    }

    /// Access token lifetime in seconds, as reported to clients
    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_seconds
    }

    /// Generate a short-lived access token for the given user
    pub fn generate_access_token(&self, user_id: &str) -> Result<String, ServiceError> {
        self.generate(user_id, &self.access_encoding_key, self.access_ttl_seconds)
    }

    /// Generate a long-lived refresh token for the given user
    pub fn generate_refresh_token(&self, user_id: &str) -> Result<String, ServiceError> {
        self.generate(user_id, &self.refresh_encoding_key, self.refresh_ttl_seconds)
    }

    fn generate(
        &self,
        user_id: &str,
        key: &EncodingKey,
        ttl_seconds: i64,
    ) -> Result<String, ServiceError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(ttl_seconds);

        let claims = Claims {
            sub: user_id.to_string(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(&Header::default(), &claims, key)
            .map_err(|e| ServiceError::internal_error(format!("Token generation failed: {e}")))
    }

    /// Validate and decode an access token
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, ServiceError> {
        self.validate(token, &self.access_decoding_key)
    }

    /// Validate and decode a refresh token
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, ServiceError> {
        self.validate(token, &self.refresh_decoding_key)
    }

    fn validate(&self, token: &str, key: &DecodingKey) -> Result<Claims, ServiceError> {
        decode::<Claims>(token, key, &self.validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| ServiceError::unauthorized(format!("Token validation failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MediaConfig;

    fn test_config() -> Config {
        Config {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            acquire_timeout_seconds: 3,
            access_token_secret: "access-secret-for-tests".to_string(),
            refresh_token_secret: "refresh-secret-for-tests".to_string(),
            access_token_ttl_seconds: 900,
            refresh_token_ttl_seconds: 604800,
            server_port: 3000,
            media: MediaConfig {
                api_base_url: "https://api.cloudinary.com/v1_1".to_string(),
                cloud_name: "test-cloud".to_string(),
                api_key: "key".to_string(),
                api_secret: "secret".to_string(),
            },
        }
    }

    #[test]
    fn access_token_roundtrip() {
        let jwt = JwtUtils::from_config(&test_config());
        let token = jwt.generate_access_token("user-123").unwrap();
        let claims = jwt.validate_access_token(&token).unwrap();
        assert_eq!(claims.user_id(), "user-123");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_token_roundtrip() {
        let jwt = JwtUtils::from_config(&test_config());
        let token = jwt.generate_refresh_token("user-456").unwrap();
        let claims = jwt.validate_refresh_token(&token).unwrap();
        assert_eq!(claims.sub, "user-456");
    }

    #[test]
    fn token_kinds_are_not_interchangeable() {
        let jwt = JwtUtils::from_config(&test_config());

        let refresh = jwt.generate_refresh_token("user-123").unwrap();
        assert!(jwt.validate_access_token(&refresh).is_err());

        let access = jwt.generate_access_token("user-123").unwrap();
        assert!(jwt.validate_refresh_token(&access).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut config = test_config();
        // Far enough in the past to clear the validator's clock-skew leeway.
        config.access_token_ttl_seconds = -7200;
        let jwt = JwtUtils::from_config(&config);

        let token = jwt.generate_access_token("user-123").unwrap();
        let err = jwt.validate_access_token(&token).unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized { .. }));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let jwt = JwtUtils::from_config(&test_config());
        let mut token = jwt.generate_access_token("user-123").unwrap();
        token.push('x');
        assert!(jwt.validate_access_token(&token).is_err());
    }
}
