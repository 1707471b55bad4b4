//! # Ecommerce Core
//!
//! 이커머스 API의 핵심 도메인 모델 및 공통 인프라를 제공합니다.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 사용자 계정 및 역할 도메인 타입
//! - 자격증명 저장소 추상화 ([`CredentialStore`])
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
