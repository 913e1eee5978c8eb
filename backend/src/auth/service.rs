//! Core business logic for the authentication system.
//!
//! The [`AuthService`] owns the session lifecycle: it issues the token pair
//! at login, rotates it on refresh, and ends the session at logout. The user
//! record's `refresh_token` column is the single source of truth for which
//! refresh token is currently live.

use crate::auth::models::*;
use crate::config::Config;
use crate::database::models::PublicUser;
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::user_repository::UserRepository;
use crate::services::user_service::UserService;
use crate::utils::jwt::JwtUtils;
use sqlx::SqlitePool;
use validator::Validate;

/// Authentication service for handling login, token rotation, and logout
pub struct AuthService<'a> {
    pool: &'a SqlitePool,
    jwt_utils: JwtUtils,
    user_service: UserService<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService instance with configuration from the
    /// environment
    pub fn new(pool: &'a SqlitePool) -> ServiceResult<Self> {
        let jwt_utils = JwtUtils::new()?;

        Ok(AuthService {
            pool,
            jwt_utils,
            user_service: UserService::new(pool),
        })
    }

    /// Create an AuthService from an already-loaded configuration
    pub fn with_config(pool: &'a SqlitePool, config: &Config) -> Self {
        AuthService {
            pool,
            jwt_utils: JwtUtils::from_config(config),
            user_service: UserService::new(pool),
        }
    }

    /// Mints a fresh access/refresh pair for the user and persists the new
    /// refresh token, overwriting (and thereby invalidating) any prior one.
    ///
    /// The persistence step is a single-column update; the rest of the user
    /// record is left untouched. A failed store write surfaces as an opaque
    /// internal error.
    pub async fn issue_token_pair(&self, user_id: &str) -> ServiceResult<TokenPair> {
        let repo = UserRepository::new(self.pool);
        let user = repo
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", user_id))?;

        let access_token = self.jwt_utils.generate_access_token(&user.id)?;
        let refresh_token = self.jwt_utils.generate_refresh_token(&user.id)?;

        repo.set_refresh_token(&user.id, &refresh_token)
            .await
            .map_err(|e| {
                tracing::error!("Failed to persist refresh token: {e}");
                ServiceError::internal_error(
                    "Something went wrong while generating access and refresh tokens",
                )
            })?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Authenticate a user and start a session.
    ///
    /// Exactly one of username or email must identify the user; the password
    /// is checked against the stored hash. On success a new token pair is
    /// issued and the public user record is returned alongside it.
    pub async fn login(&self, login_request: LoginRequest) -> ServiceResult<LoginResponse> {
        // Validate input
        if let Err(validation_errors) = login_request.validate() {
            let error_messages: Vec<String> = validation_errors
                .field_errors()
                .into_iter()
                .flat_map(|(field, errors)| {
                    errors.iter().map(move |error| {
                        format!(
                            "{}: {}",
                            field,
                            error.message.as_ref().unwrap_or(&"Invalid value".into())
                        )
                    })
                })
                .collect();
            return Err(ServiceError::validation(error_messages.join(", ")));
        }

        let user = self
            .user_service
            .authenticate_user(
                login_request.username.as_deref(),
                login_request.email.as_deref(),
                &login_request.password,
            )
            .await?;

        let tokens = self.issue_token_pair(&user.id).await?;

        Ok(LoginResponse {
            user: PublicUser::from(user),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: self.jwt_utils.access_ttl_seconds(),
        })
    }

    /// End the user's session by unsetting the stored refresh token.
    ///
    /// Idempotent: ending an already-ended session is not an error.
    pub async fn logout(&self, user_id: &str) -> ServiceResult<()> {
        let repo = UserRepository::new(self.pool);
        repo.clear_refresh_token(user_id).await?;
        Ok(())
    }

    /// Rotate the session's token pair.
    ///
    /// The presented refresh token must verify against the refresh secret
    /// and exactly equal the value currently stored on the user record; a
    /// well-signed token that no longer matches has been superseded by a
    /// later rotation or cleared by logout. The replacement is written with
    /// a conditional swap so that of any concurrent rotations presenting the
    /// same token, exactly one succeeds.
    pub async fn refresh_token(
        &self,
        presented: Option<&str>,
    ) -> ServiceResult<RefreshTokenResponse> {
        let presented = presented
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ServiceError::unauthorized("Refresh token is required"))?;

        let claims = self.jwt_utils.validate_refresh_token(presented)?;

        let repo = UserRepository::new(self.pool);
        // An unknown subject is reported as an invalid token, not NotFound:
        // callers cannot distinguish "bad token" from "bad user".
        let user = repo
            .get_user_by_id(&claims.sub)
            .await?
            .ok_or_else(|| ServiceError::unauthorized("Invalid refresh token"))?;

        if user.refresh_token.as_deref() != Some(presented) {
            return Err(ServiceError::unauthorized("Refresh token is expired or used"));
        }

        let access_token = self.jwt_utils.generate_access_token(&user.id)?;
        let refresh_token = self.jwt_utils.generate_refresh_token(&user.id)?;

        let swapped = repo
            .swap_refresh_token(&user.id, presented, &refresh_token)
            .await
            .map_err(|e| {
                tracing::error!("Failed to persist rotated refresh token: {e}");
                ServiceError::internal_error(
                    "Something went wrong while generating access and refresh tokens",
                )
            })?;

        // Lost the race against a concurrent rotation of the same token.
        if !swapped {
            return Err(ServiceError::unauthorized("Refresh token is expired or used"));
        }

        Ok(RefreshTokenResponse {
            access_token,
            refresh_token,
            expires_in: self.jwt_utils.access_ttl_seconds(),
        })
    }
}
