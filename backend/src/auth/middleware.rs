//! Middleware for protecting authenticated routes.
//!
//! Validates the access token on incoming requests and makes the decoded
//! claims available to handlers via request extensions. The token is
//! accepted from the Authorization header or the access-token cookie.

use crate::auth::handlers::ACCESS_TOKEN_COOKIE;
use crate::utils::jwt::JwtUtils;
use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

/// JWT authentication middleware
pub async fn jwt_auth(mut request: Request, next: Next) -> Result<Response, StatusCode> {
    let token = bearer_token(request.headers())
        .or_else(|| cookie_token(request.headers()))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let jwt_utils = JwtUtils::new().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    match jwt_utils.validate_access_token(&token) {
        Ok(claims) => {
            // Add claims to request extensions for use in handlers
            request.extensions_mut().insert(claims);
            Ok(next.run(request).await)
        }
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
}
