//! Axum용 JWT 인증 추출기.
//!
//! 서명 키는 [`AppState`]에 주입된 값만 사용합니다.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::jwt::{Claims, JwtError};
use super::roles::ROLE_ADMIN;
use crate::state::AppState;

/// JWT 인증 추출기.
///
/// # 사용 예시
///
/// ```rust,ignore
/// async fn protected_handler(
///     JwtAuth(claims): JwtAuth,
/// ) -> impl IntoResponse {
///     format!("Authenticated user: {}", claims.user_name)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct JwtAuth(pub Claims);

/// 인증 추출 거부 사유.
#[derive(Debug, thiserror::Error)]
pub enum JwtAuthError {
    #[error("Authorization 헤더가 없습니다")]
    MissingToken,
    #[error("Authorization 헤더는 'Bearer <token>' 형식이어야 합니다")]
    InvalidAuthHeader,
    #[error("토큰 유효 기간이 지났습니다")]
    TokenExpired,
    #[error("토큰 서명 또는 형식이 올바르지 않습니다")]
    InvalidToken,
    #[error("이 작업을 수행할 권한이 없습니다")]
    InsufficientPermission,
}

impl JwtAuthError {
    /// HTTP 상태 코드와 에러 코드.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::MissingToken => (StatusCode::UNAUTHORIZED, "MISSING_TOKEN"),
            Self::InvalidAuthHeader => (StatusCode::UNAUTHORIZED, "INVALID_AUTH_HEADER"),
            Self::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            Self::InsufficientPermission => (StatusCode::FORBIDDEN, "INSUFFICIENT_PERMISSION"),
        }
    }
}

impl From<JwtError> for JwtAuthError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::TokenExpired => Self::TokenExpired,
            _ => Self::InvalidToken,
        }
    }
}

impl IntoResponse for JwtAuthError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let body = json!({ "error": { "code": code, "message": self.to_string() } });
        (status, Json(body)).into_response()
    }
}

/// `Authorization: Bearer <token>` 헤더에서 토큰 부분만 꺼냅니다.
fn bearer_token(parts: &Parts) -> Result<&str, JwtAuthError> {
    let value = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(JwtAuthError::MissingToken)?
        .to_str()
        .map_err(|_| JwtAuthError::InvalidAuthHeader)?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(JwtAuthError::InvalidAuthHeader)
}

impl FromRequestParts<Arc<AppState>> for JwtAuth {
    type Rejection = JwtAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let verified = state.signing_key().verify(token)?;
        Ok(Self(verified.claims))
    }
}

/// 특정 역할을 요구.
///
/// # Returns
///
/// 역할이 일치하면 Ok(()), 아니면 `InsufficientPermission`
pub fn require_role(required_role: &str, claims: &Claims) -> Result<(), JwtAuthError> {
    if claims.has_role(required_role) {
        Ok(())
    } else {
        Err(JwtAuthError::InsufficientPermission)
    }
}

/// Admin 역할을 요구하는 추출기.
#[derive(Debug, Clone)]
pub struct AdminAuth(pub Claims);

impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = JwtAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let JwtAuth(claims) = JwtAuth::from_request_parts(parts, state).await?;
        require_role(ROLE_ADMIN, &claims)?;
        Ok(AdminAuth(claims))
    }
}
