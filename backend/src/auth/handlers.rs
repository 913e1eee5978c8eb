//! Handler functions for authentication-related API endpoints.
//!
//! These functions process incoming HTTP requests for user authentication
//! (registration, login, logout, token refresh), parse request data, and
//! interact with the `auth::service` and `services::user_service` for core
//! business logic. Tokens travel both as HTTP-only secure cookies and in the
//! JSON response body.

use crate::api::common::{ApiResponse, service_error_to_http};
use crate::auth::models::*;
use crate::auth::service::AuthService;
use crate::config::Config;
use crate::database::models::{PublicUser, RegisterUser};
use crate::errors::ServiceError;
use crate::services::media_service::{ImageUpload, MediaService};
use crate::services::user_service::UserService;
use crate::utils::jwt::Claims;
use axum::{
    extract::{Extension, Json, Multipart, multipart::Field},
    http::StatusCode,
    response::Json as ResponseJson,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sqlx::SqlitePool;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// HTTP-only secure session cookie carrying one of the two tokens
fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_http_only(true);
    cookie.set_secure(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_path("/");
    cookie
}

/// Removal counterpart of [`session_cookie`]; the path must match for the
/// browser to drop the original
fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, "");
    cookie.set_path("/");
    cookie
}

/// Handle user registration request (multipart form with avatar and
/// optional cover image)
#[axum::debug_handler]
pub async fn register(
    Extension(pool): Extension<SqlitePool>,
    mut multipart: Multipart,
) -> Result<(StatusCode, ResponseJson<ApiResponse<PublicUser>>), (StatusCode, String)> {
    let mut full_name = None;
    let mut email = None;
    let mut username = None;
    let mut password = None;
    let mut avatar = None;
    let mut cover_image = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        service_error_to_http(ServiceError::validation(format!(
            "Invalid multipart payload: {e}"
        )))
    })? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("full_name") => full_name = Some(read_text(field).await?),
            Some("email") => email = Some(read_text(field).await?),
            Some("username") => username = Some(read_text(field).await?),
            Some("password") => password = Some(read_text(field).await?),
            Some("avatar") => avatar = Some(read_image(field).await?),
            Some("cover_image") => cover_image = Some(read_image(field).await?),
            _ => {}
        }
    }

    let register = RegisterUser {
        full_name: full_name.unwrap_or_default(),
        email: email.unwrap_or_default(),
        username: username.unwrap_or_default(),
        password: password.unwrap_or_default(),
    };

    let avatar = avatar.ok_or_else(|| {
        service_error_to_http(ServiceError::validation("Avatar file is required"))
    })?;

    let config = Config::from_env().map_err(|e| {
        service_error_to_http(ServiceError::internal_error(format!("Config error: {e}")))
    })?;
    let media_service = MediaService::new(config.media);

    let user_service = UserService::new(&pool);
    match user_service
        .register_user(register, avatar, cover_image, &media_service)
        .await
    {
        Ok(user) => Ok((
            StatusCode::CREATED,
            ResponseJson(ApiResponse::success(
                PublicUser::from(user),
                "User registered successfully",
            )),
        )),
        Err(error) => Err(service_error_to_http(error)),
    }
}

async fn read_text(field: Field<'_>) -> Result<String, (StatusCode, String)> {
    field.text().await.map_err(|e| {
        service_error_to_http(ServiceError::validation(format!(
            "Invalid multipart field: {e}"
        )))
    })
}

async fn read_image(field: Field<'_>) -> Result<ImageUpload, (StatusCode, String)> {
    let file_name = field
        .file_name()
        .map(str::to_string)
        .unwrap_or_else(|| "upload".to_string());
    let content_type = field.content_type().map(str::to_string);
    let data = field.bytes().await.map_err(|e| {
        service_error_to_http(ServiceError::validation(format!(
            "Failed to read uploaded file: {e}"
        )))
    })?;

    Ok(ImageUpload {
        file_name,
        content_type,
        data,
    })
}

/// Handle user login request
#[axum::debug_handler]
pub async fn login(
    Extension(pool): Extension<SqlitePool>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, ResponseJson<ApiResponse<LoginResponse>>), (StatusCode, String)> {
    let auth_service = match AuthService::new(&pool) {
        Ok(service) => service,
        Err(error) => return Err(service_error_to_http(error)),
    };

    match auth_service.login(payload).await {
        Ok(response) => {
            let jar = jar
                .add(session_cookie(
                    ACCESS_TOKEN_COOKIE,
                    response.access_token.clone(),
                ))
                .add(session_cookie(
                    REFRESH_TOKEN_COOKIE,
                    response.refresh_token.clone(),
                ));
            Ok((
                jar,
                ResponseJson(ApiResponse::success(response, "User logged in successfully")),
            ))
        }
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle token refresh request. The refresh token is read from the cookie
/// first, then from the JSON body.
#[axum::debug_handler]
pub async fn refresh_token(
    Extension(pool): Extension<SqlitePool>,
    jar: CookieJar,
    payload: Option<Json<RefreshTokenRequest>>,
) -> Result<(CookieJar, ResponseJson<ApiResponse<RefreshTokenResponse>>), (StatusCode, String)> {
    let presented = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .or_else(|| payload.and_then(|Json(body)| body.refresh_token));

    let auth_service = match AuthService::new(&pool) {
        Ok(service) => service,
        Err(error) => return Err(service_error_to_http(error)),
    };

    match auth_service.refresh_token(presented.as_deref()).await {
        Ok(response) => {
            let jar = jar
                .add(session_cookie(
                    ACCESS_TOKEN_COOKIE,
                    response.access_token.clone(),
                ))
                .add(session_cookie(
                    REFRESH_TOKEN_COOKIE,
                    response.refresh_token.clone(),
                ));
            Ok((
                jar,
                ResponseJson(ApiResponse::success(response, "Access token refreshed")),
            ))
        }
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle logout request: clears the stored refresh token and both cookies
#[axum::debug_handler]
pub async fn logout(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
    jar: CookieJar,
) -> Result<(CookieJar, ResponseJson<ApiResponse<serde_json::Value>>), (StatusCode, String)> {
    let auth_service = match AuthService::new(&pool) {
        Ok(service) => service,
        Err(error) => return Err(service_error_to_http(error)),
    };

    match auth_service.logout(claims.user_id()).await {
        Ok(()) => {
            let jar = jar
                .remove(removal_cookie(ACCESS_TOKEN_COOKIE))
                .remove(removal_cookie(REFRESH_TOKEN_COOKIE));
            Ok((
                jar,
                ResponseJson(ApiResponse::success(
                    serde_json::json!({}),
                    "User logged out",
                )),
            ))
        }
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Get current user information from the access token
#[axum::debug_handler]
pub async fn me(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<ResponseJson<ApiResponse<PublicUser>>, (StatusCode, String)> {
    let user_service = UserService::new(&pool);

    match user_service.get_user_required(claims.user_id()).await {
        Ok(user) => Ok(ResponseJson(ApiResponse::success(
            PublicUser::from(user),
            "Current user fetched",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}
