//! Database repository for user management operations.
//!
//! Provides CRUD operations for system users, including the single-field
//! refresh-token updates used by the session lifecycle.

use crate::database::models::{CreateUser, User};
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

/// Repository for user database operations.
///
/// Handles all persistence operations for the User entity. The stored
/// refresh token is only ever touched through the dedicated single-column
/// updates below; full-record writes never run as part of token issuance.
pub struct UserRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Creates a new UserRepository instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a new user in the database.
    ///
    /// # Arguments
    /// * `create` - CreateUser DTO containing user details
    ///
    /// # Returns
    /// The newly created User with all fields populated
    pub async fn create_user(&self, create: CreateUser) -> Result<User> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, full_name, password_hash,
                               avatar_url, cover_image_url, refresh_token,
                               created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&create.id)
        .bind(&create.username)
        .bind(&create.email)
        .bind(&create.full_name)
        .bind(&create.password_hash)
        .bind(&create.avatar_url)
        .bind(&create.cover_image_url)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(user)
    }

    /// Retrieves a user by their unique identifier.
    ///
    /// # Arguments
    /// * `id` - User ID (UUID format)
    ///
    /// # Returns
    /// `Some(User)` if found, `None` otherwise
    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(user)
    }

    /// Retrieves a user by their username.
    ///
    /// # Arguments
    /// * `username` - Username to search for
    ///
    /// # Returns
    /// `Some(User)` if found, `None` otherwise
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(self.pool)
            .await?;

        Ok(user)
    }

    /// Retrieves a user by their email.
    ///
    /// # Arguments
    /// * `email` - Email to search for
    ///
    /// # Returns
    /// `Some(User)` if found, `None` otherwise
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(self.pool)
            .await?;

        Ok(user)
    }

    /// Checks if a username already exists in the system.
    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
                .bind(username)
                .fetch_one(self.pool)
                .await?;

        Ok(count > 0)
    }

    /// Checks if an email already exists in the system.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Stores a newly issued refresh token on the user record, overwriting
    /// any prior value. Single-column update; the rest of the record is not
    /// validated or rewritten.
    ///
    /// # Arguments
    /// * `user_id` - User ID (UUID format)
    /// * `refresh_token` - The token string to persist
    pub async fn set_refresh_token(&self, user_id: &str, refresh_token: &str) -> Result<()> {
        sqlx::query("UPDATE users SET refresh_token = ?, updated_at = ? WHERE id = ?")
            .bind(refresh_token)
            .bind(Utc::now())
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Replaces the stored refresh token only if it still equals `current`.
    ///
    /// This is the conditional update that makes rotation safe under
    /// concurrent requests presenting the same token: of any set of racing
    /// rotations, exactly one swap succeeds.
    ///
    /// # Returns
    /// `true` if the swap was applied, `false` if the stored token no longer
    /// matched `current`
    pub async fn swap_refresh_token(
        &self,
        user_id: &str,
        current: &str,
        replacement: &str,
    ) -> Result<bool> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token = ?,
                updated_at = ?
            WHERE id = ? AND refresh_token = ?
            "#,
        )
        .bind(replacement)
        .bind(Utc::now())
        .bind(user_id)
        .bind(current)
        .execute(self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    /// Unsets the stored refresh token (NULL, not empty string). Idempotent:
    /// clearing an already-cleared token is not an error.
    ///
    /// # Arguments
    /// * `user_id` - User ID (UUID format)
    pub async fn clear_refresh_token(&self, user_id: &str) -> Result<()> {
        sqlx::query("UPDATE users SET refresh_token = NULL, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use uuid::Uuid;

    async fn setup_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    async fn seed(pool: &SqlitePool) -> User {
        UserRepository::new(pool)
            .create_user(CreateUser {
                id: Uuid::now_v7().to_string(),
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                full_name: "Alice".to_string(),
                password_hash: "hash".to_string(),
                avatar_url: "https://media.test/avatar.png".to_string(),
                cover_image_url: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn new_users_have_no_refresh_token() {
        let pool = setup_pool().await;
        let user = seed(&pool).await;
        assert_eq!(user.refresh_token, None);
    }

    #[tokio::test]
    async fn swap_applies_only_while_the_current_token_matches() {
        let pool = setup_pool().await;
        let user = seed(&pool).await;
        let repo = UserRepository::new(&pool);

        repo.set_refresh_token(&user.id, "r0").await.unwrap();

        // First swap wins
        assert!(repo.swap_refresh_token(&user.id, "r0", "r1").await.unwrap());

        // A racing swap presenting the same superseded token loses
        assert!(!repo.swap_refresh_token(&user.id, "r0", "r2").await.unwrap());

        let stored = repo.get_user_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn swap_does_not_match_a_cleared_token() {
        let pool = setup_pool().await;
        let user = seed(&pool).await;
        let repo = UserRepository::new(&pool);

        repo.set_refresh_token(&user.id, "r0").await.unwrap();
        repo.clear_refresh_token(&user.id).await.unwrap();

        assert!(!repo.swap_refresh_token(&user.id, "r0", "r1").await.unwrap());

        // Clearing twice is fine
        repo.clear_refresh_token(&user.id).await.unwrap();
        let stored = repo.get_user_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.refresh_token, None);
    }

    #[tokio::test]
    async fn lookups_by_username_and_email() {
        let pool = setup_pool().await;
        let user = seed(&pool).await;
        let repo = UserRepository::new(&pool);

        assert_eq!(
            repo.get_user_by_username("alice").await.unwrap().unwrap().id,
            user.id
        );
        assert_eq!(
            repo.get_user_by_email("alice@example.com")
                .await
                .unwrap()
                .unwrap()
                .id,
            user.id
        );
        assert!(repo.get_user_by_username("bob").await.unwrap().is_none());

        assert!(repo.username_exists("alice").await.unwrap());
        assert!(!repo.username_exists("bob").await.unwrap());
        assert!(repo.email_exists("alice@example.com").await.unwrap());
    }
}
