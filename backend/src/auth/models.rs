//! Data structures for authentication-related entities.
//!
//! This module defines the request and response payloads for login, logout,
//! and token rotation, plus the ephemeral token pair itself.

use crate::database::models::PublicUser;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login request payload. Exactly one of `username` or `email` must be
/// supplied; the service enforces this.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    pub username: Option<String>,

    pub email: Option<String>,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response containing tokens and the public user record
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64, // Access token expiration in seconds
}

/// Token refresh request. The token may instead arrive via the refresh
/// cookie, so the body field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: Option<String>,
}

/// Token refresh response
#[derive(Debug, Serialize)]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// A freshly minted access/refresh pair. Never partially constructed: the
/// pair exists only after the refresh token has been durably stored.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}
