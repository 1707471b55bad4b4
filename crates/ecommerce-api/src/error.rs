//! 통합 API 에러 응답 타입.
//!
//! 모든 API 엔드포인트에서 일관된 에러 형식을 제공합니다.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;
use validator::ValidationErrors;

use crate::auth::AuthError;
use ecommerce_core::StoreError;

/// 통합 API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "USER_EXISTS",
///   "message": "이미 존재하는 사용자입니다: alice",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "VALIDATION_ERROR", "USER_EXISTS", "NOT_FOUND")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp, 선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    ///
    /// # Example
    ///
    /// ```
    /// use ecommerce_api::error::ApiErrorResponse;
    ///
    /// let error = ApiErrorResponse::new("NOT_FOUND", "User not found");
    /// assert_eq!(error.code(), "NOT_FOUND");
    /// ```
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }

    /// 에러 코드 반환.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// 에러 메시지 반환.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;

/// 요청 DTO 검증 실패를 400 응답으로 변환.
pub fn validation_failed(errors: ValidationErrors) -> (StatusCode, Json<ApiErrorResponse>) {
    let details = serde_json::to_value(&errors).unwrap_or(Value::Null);
    (
        StatusCode::BAD_REQUEST,
        Json(ApiErrorResponse::with_details(
            "VALIDATION_ERROR",
            "요청 값이 허용 범위를 벗어났습니다",
            details,
        )),
    )
}

/// 요청 본문 JSON 해석 실패(필드 누락, 타입 불일치, 문법 오류)를 400 응답으로 변환.
pub fn json_rejected(rejection: JsonRejection) -> (StatusCode, Json<ApiErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiErrorResponse::new(
            "VALIDATION_ERROR",
            format!("요청 본문을 해석할 수 없습니다: {}", rejection.body_text()),
        )),
    )
}

impl AuthError {
    /// HTTP 상태 코드와 에러 코드.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AuthError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AuthError::DuplicateUser(_) | AuthError::Store(StoreError::Conflict(_)) => {
                (StatusCode::CONFLICT, "USER_EXISTS")
            }
            AuthError::Store(StoreError::Storage(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR")
            }
            AuthError::Password(_) | AuthError::Token(_) | AuthError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }

    /// API 에러 응답으로 변환.
    ///
    /// 5xx 에러는 상세 내용을 로그에만 남기고 응답에는 일반 메시지를 사용합니다.
    pub fn into_api_error(self) -> (StatusCode, Json<ApiErrorResponse>) {
        let (status, code) = self.status_and_code();
        let message = if status.is_server_error() {
            error!(error = %self, code, "Request failed");
            "요청을 처리하는 중 서버 오류가 발생했습니다".to_string()
        } else {
            self.to_string()
        };
        (status, Json(ApiErrorResponse::new(code, message)))
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.into_api_error().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_api_error_response_new() {
        let error = ApiErrorResponse::new("TEST_ERROR", "Test message");
        assert_eq!(error.code, "TEST_ERROR");
        assert_eq!(error.message, "Test message");
        assert!(error.timestamp.is_some());
        assert!(error.details.is_none());
    }

    #[test]
    fn test_json_omits_empty_details() {
        let error = ApiErrorResponse::new("NOT_FOUND", "Resource not found");
        let json = serde_json::to_string(&error).unwrap();

        assert!(!json.contains("details"));
        assert!(json.contains(r#""code":"NOT_FOUND""#));
    }

    #[test]
    fn test_auth_error_status_mapping() {
        let cases = vec![
            (AuthError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AuthError::DuplicateUser("alice".into()), StatusCode::CONFLICT),
            (
                AuthError::Store(StoreError::Conflict("alice".into())),
                StatusCode::CONFLICT,
            ),
            (
                AuthError::Store(StoreError::Storage("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AuthError::Internal("join".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status_and_code().0, expected);
        }
    }

    #[test]
    fn test_storage_details_not_exposed() {
        let (status, Json(body)) =
            AuthError::Store(StoreError::Storage("password=hunter2 host=db".into()))
                .into_api_error();

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, "STORAGE_ERROR");
        assert!(!body.message.contains("hunter2"));
    }

    #[test]
    fn test_validation_failed_has_details() {
        let request = crate::auth::LoginRequest {
            username: "a".repeat(300),
            password: "pw".to_string(),
        };
        let errors = request.validate().unwrap_err();
        let (status, Json(body)) = validation_failed(errors);

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "VALIDATION_ERROR");
        assert!(body.details.is_some());
    }
}
