//! User business logic service.
//!
//! Handles registration (including media uploads) and credential checks
//! against the stored password hash.

use crate::database::models::{CreateUser, RegisterUser, User};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::user_repository::UserRepository;
use crate::services::media_service::{ImageUpload, MediaService};
use bcrypt::{DEFAULT_COST, hash, verify};
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

pub struct UserService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserService<'a> {
    /// Creates a new UserService instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Registers a new user.
    ///
    /// Uploads the avatar (required) and cover image (optional) to the media
    /// host, hashes the password, and creates the user record. A failed
    /// cover-image upload is tolerated; a failed avatar upload aborts the
    /// registration.
    ///
    /// # Errors
    /// Returns `ServiceError` for:
    /// - Validation failures
    /// - Duplicate username or email
    /// - Avatar upload failures
    pub async fn register_user(
        &self,
        register: RegisterUser,
        avatar: ImageUpload,
        cover_image: Option<ImageUpload>,
        media: &MediaService,
    ) -> ServiceResult<User> {
        // Input validation using validator crate
        if let Err(validation_errors) = register.validate() {
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

        let username = register.username.trim().to_lowercase();
        let email = register.email.trim().to_string();

        let repo = UserRepository::new(self.pool);

        if repo.username_exists(&username).await? {
            return Err(ServiceError::already_exists("User", &username));
        }

        if repo.email_exists(&email).await? {
            return Err(ServiceError::already_exists("User", &email));
        }

        let avatar_url = media.upload_image(avatar).await?.url;

        let cover_image_url = match cover_image {
            Some(image) => match media.upload_image(image).await {
                Ok(uploaded) => Some(uploaded.url),
                Err(e) => {
                    tracing::warn!("Cover image upload failed, continuing without it: {e}");
                    None
                }
            },
            None => None,
        };

        let password_hash = Self::hash_password(&register.password)?;

        let data = CreateUser {
            id: Uuid::now_v7().to_string(),
            username,
            email,
            full_name: register.full_name.trim().to_string(),
            password_hash,
            avatar_url,
            cover_image_url,
        };

        let user = repo.create_user(data).await?;
        Ok(user)
    }

    /// Authenticates a user by exactly one of username or email.
    ///
    /// Empty or whitespace-only identifiers count as absent. Supplying
    /// neither, or both, is a validation error; an unknown identifier is
    /// `NotFound`; a wrong password is `Unauthorized`.
    pub async fn authenticate_user(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        password: &str,
    ) -> ServiceResult<User> {
        let username = username.map(str::trim).filter(|u| !u.is_empty());
        let email = email.map(str::trim).filter(|e| !e.is_empty());

        let repo = UserRepository::new(self.pool);

        let (user, identifier) = match (username, email) {
            (Some(u), None) => (repo.get_user_by_username(&u.to_lowercase()).await?, u),
            (None, Some(e)) => (repo.get_user_by_email(e).await?, e),
            _ => {
                return Err(ServiceError::validation(
                    "Either a username or an email is required",
                ));
            }
        };

        let user = user.ok_or_else(|| ServiceError::not_found("User", identifier))?;

        if !Self::verify_password(password, &user.password_hash)? {
            return Err(ServiceError::unauthorized("Incorrect password"));
        }

        Ok(user)
    }

    /// Retrieves a user by ID with existence verification.
    ///
    /// # Errors
    /// Returns `ServiceError::NotFound` if the user doesn't exist
    pub async fn get_user_required(&self, id: &str) -> ServiceResult<User> {
        let repo = UserRepository::new(self.pool);
        let user = repo
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))?;
        Ok(user)
    }

    /// Function to hash a password before storing in database
    fn hash_password(password: &str) -> ServiceResult<String> {
        hash(password, DEFAULT_COST)
            .map_err(|e| ServiceError::internal_error(format!("Password hashing failed: {e}")))
    }

    /// Function to verify a password against the stored hash
    fn verify_password(password: &str, hash: &str) -> ServiceResult<bool> {
        verify(password, hash)
            .map_err(|e| ServiceError::internal_error(format!("Password verification failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_password() {
        let hash = UserService::hash_password("mypassword").unwrap();
        assert!(UserService::verify_password("mypassword", &hash).unwrap());
        assert!(!UserService::verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let first = UserService::hash_password("mypassword").unwrap();
        let second = UserService::hash_password("mypassword").unwrap();
        assert_ne!(first, second);
    }
}
