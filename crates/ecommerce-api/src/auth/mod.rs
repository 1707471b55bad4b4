//! 인증 및 권한 부여.
//!
//! JWT 기반 인증 및 역할 기반 접근 제어(RBAC)를 제공합니다.
//!
//! # 구성 요소
//!
//! - [`AuthService`]: 가입/로그인 (해싱 정책, 토큰 발급 정책 소유)
//! - [`Claims`], [`SigningKey`]: JWT 페이로드와 프로세스 전역 서명 키
//! - [`JwtAuth`], [`AdminAuth`]: Axum 핸들러용 인증 추출기
//! - 비밀번호 해싱/검증 함수
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! // 보호된 라우트에서 JwtAuth 추출기 사용
//! async fn protected_handler(
//!     JwtAuth(claims): JwtAuth,
//! ) -> impl IntoResponse {
//!     format!("Hello, {}!", claims.user_name)
//! }
//! ```

mod jwt;
mod middleware;
mod password;
mod roles;
mod service;

pub use jwt::{Claims, JwtError, SigningKey, TOKEN_LIFETIME_HOURS};
pub use middleware::{require_role, AdminAuth, JwtAuth, JwtAuthError};
pub use password::{hash_password, verify_against_decoy, verify_password, PasswordError};
pub use roles::{effective_role, ROLE_ADMIN, ROLE_USER};
pub use service::{
    AuthError, AuthService, DenialReason, LoginOutcome, LoginRequest, LoginSuccess,
    RegisterRequest, LOGIN_DENIED_MESSAGE, LOGIN_SUCCESS_MESSAGE,
};
