//! 사용자 가입/로그인/조회 endpoint.
//!
//! # 엔드포인트
//!
//! - `POST /api/v1/users` - 회원 가입
//! - `POST /api/v1/users/login` - 로그인 (JWT 발급)
//! - `GET /api/v1/users` - 사용자 목록 (Admin 전용)
//! - `GET /api/v1/users/{id}` - 사용자 조회 (Admin 또는 본인)

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use ecommerce_core::PublicUser;

use crate::auth::{
    AdminAuth, AuthError, JwtAuth, JwtAuthError, LoginOutcome, LoginRequest, RegisterRequest,
    LOGIN_DENIED_MESSAGE, LOGIN_SUCCESS_MESSAGE, ROLE_ADMIN,
};
use crate::error::{json_rejected, validation_failed, ApiErrorResponse, ApiResult};
use crate::state::AppState;

// ================================================================================================
// Response Types
// ================================================================================================

/// 로그인 응답.
///
/// 거부 시에도 같은 형태를 유지합니다 (`token`은 빈 문자열, `user`는 null).
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: Option<PublicUser>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl LoginResponse {
    fn denied() -> Self {
        Self {
            token: String::new(),
            user: None,
            message: LOGIN_DENIED_MESSAGE.to_string(),
            expires_at: None,
        }
    }
}

/// 사용자 목록 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct UsersListResponse {
    pub users: Vec<PublicUser>,
    pub total: usize,
}

// ================================================================================================
// Handlers
// ================================================================================================

/// 회원 가입.
///
/// POST /api/v1/users
async fn register_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PublicUser>)> {
    let Json(request) = payload.map_err(json_rejected)?;
    request.validate().map_err(validation_failed)?;

    let user = state
        .auth
        .register(request)
        .await
        .map_err(AuthError::into_api_error)?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// 로그인.
///
/// POST /api/v1/users/login
async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<LoginResponse>)> {
    let Json(request) = payload.map_err(json_rejected)?;
    request.validate().map_err(validation_failed)?;

    let outcome = state
        .auth
        .login(request)
        .await
        .map_err(AuthError::into_api_error)?;

    let response = match outcome {
        LoginOutcome::Authenticated(success) => (
            StatusCode::OK,
            Json(LoginResponse {
                token: success.token,
                user: Some(success.user),
                message: LOGIN_SUCCESS_MESSAGE.to_string(),
                expires_at: Some(success.expires_at),
            }),
        ),
        LoginOutcome::Denied(reason) => {
            debug!(reason = reason.as_str(), "Responding with login denial");
            (StatusCode::UNAUTHORIZED, Json(LoginResponse::denied()))
        }
    };

    Ok(response)
}

/// 사용자 목록 (사용자명 순).
///
/// GET /api/v1/users
async fn list_users(
    AdminAuth(_claims): AdminAuth,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<UsersListResponse>> {
    let users = state
        .auth
        .list_users()
        .await
        .map_err(AuthError::into_api_error)?;

    Ok(Json(UsersListResponse {
        total: users.len(),
        users,
    }))
}

/// 단일 사용자 조회.
///
/// GET /api/v1/users/{id}
async fn get_user(
    JwtAuth(claims): JwtAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PublicUser>, Response> {
    let id = Uuid::parse_str(&id).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiErrorResponse::new(
                "INVALID_ID",
                format!("잘못된 사용자 ID 형식: {}", id),
            )),
        )
            .into_response()
    })?;

    if !claims.has_role(ROLE_ADMIN) && claims.user_id() != Some(id) {
        return Err(JwtAuthError::InsufficientPermission.into_response());
    }

    let user = state
        .auth
        .get_user(id)
        .await
        .map_err(IntoResponse::into_response)?;

    user.map(Json).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ApiErrorResponse::new(
                "NOT_FOUND",
                format!("사용자를 찾을 수 없습니다: {}", id),
            )),
        )
            .into_response()
    })
}

// ================================================================================================
// Router
// ================================================================================================

/// 사용자 라우터 생성.
pub fn users_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(register_user).get(list_users))
        .route("/login", post(login))
        .route("/{id}", get(get_user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Claims;
    use crate::routes::create_api_router;
    use crate::state::create_test_state;
    use axum::{body::Body, http::Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> (Router, Arc<AppState>) {
        let state = Arc::new(create_test_state());
        (create_api_router().with_state(state.clone()), state)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, value)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_with_token(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    async fn register(app: &Router, username: &str, role: Option<&str>) -> Value {
        let mut body = json!({ "username": username, "password": "pa55word", "displayName": "Tester" });
        if let Some(role) = role {
            body["role"] = json!(role);
        }
        let (status, user) = send(app, post_json("/api/v1/users", body)).await;
        assert_eq!(status, StatusCode::CREATED);
        user
    }

    async fn login_token(app: &Router, username: &str) -> String {
        let (status, body) = send(
            app,
            post_json(
                "/api/v1/users/login",
                json!({ "username": username, "password": "pa55word" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_register_returns_public_user() {
        let (app, _) = app();

        let user = register(&app, "alice", None).await;

        assert_eq!(user["username"], "alice");
        assert_eq!(user["displayName"], "Tester");
        assert_eq!(user["role"], "User");
        assert!(user.get("passwordHash").is_none());
        assert!(user.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_register_duplicate_returns_conflict() {
        let (app, _) = app();
        register(&app, "Alice", None).await;

        let (status, body) = send(
            &app,
            post_json(
                "/api/v1/users",
                json!({ "username": "alice ", "password": "other" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "USER_EXISTS");
    }

    #[tokio::test]
    async fn test_register_validation_errors() {
        let (app, _) = app();

        let (blank, body) = send(
            &app,
            post_json("/api/v1/users", json!({ "username": "  ", "password": "pw" })),
        )
        .await;
        assert_eq!(blank, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (too_long, body) = send(
            &app,
            post_json(
                "/api/v1/users",
                json!({ "username": "bob", "password": "pw", "role": "r".repeat(65) }),
            ),
        )
        .await;
        assert_eq!(too_long, StatusCode::BAD_REQUEST);
        assert!(body.get("details").is_some());
    }

    #[tokio::test]
    async fn test_missing_or_malformed_fields_are_validation_errors() {
        let (app, _) = app();

        for uri in ["/api/v1/users", "/api/v1/users/login"] {
            let (status, body) = send(&app, post_json(uri, json!({ "username": "alice" }))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["code"], "VALIDATION_ERROR");

            let (status, body) = send(
                &app,
                post_json(uri, json!({ "username": 42, "password": "pw" })),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["code"], "VALIDATION_ERROR");
        }

        let broken = Request::builder()
            .method("POST")
            .uri("/api/v1/users/login")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app, broken).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_login_success_issues_token() {
        let (app, state) = app();
        let user = register(&app, "carol", Some("Admin")).await;

        let (status, body) = send(
            &app,
            post_json(
                "/api/v1/users/login",
                json!({ "username": "CAROL", "password": "pa55word" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], LOGIN_SUCCESS_MESSAGE);
        assert_eq!(body["user"], user);
        assert!(body["expiresAt"].is_string());

        let token = body["token"].as_str().unwrap();
        assert_eq!(token.split('.').count(), 3);
        let claims = state.signing_key().verify(token).unwrap().claims;
        assert_eq!(claims.user_name, "carol");
        assert_eq!(claims.role, "Admin");
    }

    #[tokio::test]
    async fn test_login_denials_are_indistinguishable() {
        let (app, _) = app();
        register(&app, "dave", None).await;

        let (wrong_status, wrong) = send(
            &app,
            post_json(
                "/api/v1/users/login",
                json!({ "username": "dave", "password": "nope" }),
            ),
        )
        .await;
        let (unknown_status, unknown) = send(
            &app,
            post_json(
                "/api/v1/users/login",
                json!({ "username": "ghost", "password": "pa55word" }),
            ),
        )
        .await;

        assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong, unknown);
        assert_eq!(wrong["token"], "");
        assert!(wrong["user"].is_null());
        assert_eq!(wrong["message"], LOGIN_DENIED_MESSAGE);
    }

    #[tokio::test]
    async fn test_list_users_requires_admin() {
        let (app, _) = app();
        register(&app, "zoe", None).await;
        register(&app, "adam", Some("Admin")).await;

        let missing = Request::builder()
            .uri("/api/v1/users")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, missing).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let user_token = login_token(&app, "zoe").await;
        let (status, body) = send(&app, get_with_token("/api/v1/users", &user_token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "INSUFFICIENT_PERMISSION");

        let admin_token = login_token(&app, "adam").await;
        let (status, body) = send(&app, get_with_token("/api/v1/users", &admin_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        assert_eq!(body["users"][0]["username"], "adam");
        assert_eq!(body["users"][1]["username"], "zoe");
    }

    #[tokio::test]
    async fn test_get_user_self_or_admin() {
        let (app, _) = app();
        let erin = register(&app, "erin", None).await;
        let frank = register(&app, "frank", None).await;
        register(&app, "root", Some("Admin")).await;

        let erin_token = login_token(&app, "erin").await;
        let erin_uri = format!("/api/v1/users/{}", erin["id"].as_str().unwrap());
        let frank_uri = format!("/api/v1/users/{}", frank["id"].as_str().unwrap());

        let (status, body) = send(&app, get_with_token(&erin_uri, &erin_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, erin);

        let (status, _) = send(&app, get_with_token(&frank_uri, &erin_token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let admin_token = login_token(&app, "root").await;
        let (status, body) = send(&app, get_with_token(&frank_uri, &admin_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, frank);
    }

    #[tokio::test]
    async fn test_get_user_not_found_and_malformed_id() {
        let (app, state) = app();
        let admin = Claims::new(Uuid::new_v4(), "admin", Some(ROLE_ADMIN), Utc::now());
        let token = state.signing_key().sign(&admin).unwrap();

        let missing_uri = format!("/api/v1/users/{}", Uuid::new_v4());
        let (status, body) = send(&app, get_with_token(&missing_uri, &token)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");

        let (status, body) = send(&app, get_with_token("/api/v1/users/not-a-uuid", &token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_ID");
    }
}
