//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 Arc로 래핑되어 여러 요청 간에 공유됩니다.
//! 서명 키는 시작 시 한 번 주입되며 이후 변경되지 않습니다.

use std::sync::Arc;

use ecommerce_core::CredentialStore;
use tracing::warn;

use crate::auth::{AuthService, SigningKey};

/// 애플리케이션 공유 상태.
///
/// Axum의 State extractor를 통해 핸들러에 주입됩니다.
#[derive(Clone)]
pub struct AppState {
    /// 인증 서비스 (가입, 로그인, 사용자 조회)
    pub auth: AuthService,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 새로운 AppState 생성.
    pub fn new(auth: AuthService) -> Self {
        Self {
            auth,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 토큰 서명/검증 키.
    pub fn signing_key(&self) -> &Arc<SigningKey> {
        self.auth.signing_key()
    }

    /// 자격증명 저장소.
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        self.auth.store()
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }

    /// 저장소 연결 상태 확인.
    pub async fn is_store_healthy(&self) -> bool {
        match self.store().ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Credential store ping failed");
                false
            }
        }
    }
}

/// 테스트용 AppState 생성 헬퍼.
///
/// 실제 DB 연결 없이 인메모리 저장소와 고정된 테스트 키로 상태를 생성합니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    use crate::repository::InMemoryCredentialStore;
    use secrecy::SecretString;

    let secret = SecretString::new("test-only-signing-secret-0123456789".to_string().into());
    let signing_key = Arc::new(SigningKey::from_secret(&secret));
    let store = Arc::new(InMemoryCredentialStore::new());

    AppState::new(AuthService::new(store, signing_key))
}
