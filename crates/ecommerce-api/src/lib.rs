//! 이커머스 인증 REST API.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API
//! - Argon2id 비밀번호 해싱과 JWT 발급
//! - PostgreSQL / 인메모리 자격증명 저장소
//! - 헬스 체크 엔드포인트
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: 가입/로그인, JWT 인증 및 권한 관리
//! - [`repository`]: 자격증명 저장소 구현
//! - [`error`]: 통합 API 에러 응답

pub mod auth;
pub mod error;
pub mod repository;
pub mod routes;
pub mod state;

pub use auth::{
    hash_password, verify_password, AdminAuth, AuthError, AuthService, Claims, JwtAuth,
    JwtAuthError, LoginOutcome, SigningKey,
};
pub use error::{ApiErrorResponse, ApiResult};
pub use repository::PgCredentialStore;
pub use routes::*;
pub use state::AppState;

#[cfg(any(test, feature = "test-utils"))]
pub use state::create_test_state;
