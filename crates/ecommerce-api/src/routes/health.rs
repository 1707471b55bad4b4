//! 헬스 체크 endpoint.
//!
//! - `GET /health`: 프로세스 생존 여부 (liveness)
//! - `GET /health/ready`: 자격증명 저장소 응답 여부 (readiness)

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// 의존성 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Up,
    Down,
}

/// 개별 의존성 점검 결과.
#[derive(Debug, Serialize, Deserialize)]
pub struct DependencyCheck {
    pub name: String,
    pub status: CheckStatus,
    /// 점검에 걸린 시간 (밀리초)
    pub latency_ms: u64,
}

/// readiness 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// 모든 의존성이 `up`이면 `true`
    pub ready: bool,
    pub version: String,
    pub uptime_secs: i64,
    /// RFC 3339
    pub checked_at: String,
    pub checks: Vec<DependencyCheck>,
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /health/ready
///
/// 저장소가 응답하지 않으면 503을 반환합니다.
pub async fn health_ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let started = Instant::now();
    let store_up = state.is_store_healthy().await;

    let checks = vec![DependencyCheck {
        name: "credential_store".to_string(),
        status: if store_up {
            CheckStatus::Up
        } else {
            CheckStatus::Down
        },
        latency_ms: started.elapsed().as_millis() as u64,
    }];

    let ready = checks.iter().all(|c| c.status == CheckStatus::Up);
    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = ReadinessResponse {
        ready,
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        checked_at: chrono::Utc::now().to_rfc3339(),
        checks,
    };

    (status_code, Json(response))
}

/// 헬스 체크 라우터 생성.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(health_ready))
}
