//! 이커머스 인증 API 서버.
//!
//! 설정을 로드하고 PostgreSQL 저장소와 서명 키를 준비한 뒤
//! Axum 기반 REST API 서버를 시작합니다.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::StatusCode;
use sqlx::postgres::PgPoolOptions;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use ecommerce_api::auth::{AuthService, SigningKey};
use ecommerce_api::repository::PgCredentialStore;
use ecommerce_api::routes::create_api_router;
use ecommerce_api::state::AppState;
use ecommerce_core::{init_logging, AppConfig, LogConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    let config = AppConfig::load_default().context("설정 로드 실패")?;

    init_logging(LogConfig::from_settings(&config.logging))
        .map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    info!("Starting e-commerce API server...");

    // 서명 키가 없으면 기동하지 않음
    let secret = config.api_settings.signing_secret().map_err(|e| {
        error!("JWT signing key is not configured (ECOMMERCE__API_SETTINGS__SECRET_KEY)");
        anyhow::Error::new(e).context("서명 키가 설정되지 않았습니다")
    })?;
    let signing_key = Arc::new(SigningKey::from_secret(&secret));

    let database_url = config
        .database
        .resolve_url()
        .context("database.url 또는 DATABASE_URL이 필요합니다")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.connection_timeout_secs))
        .connect(&database_url)
        .await
        .context("데이터베이스 연결 실패")?;
    info!("Connected to PostgreSQL successfully");

    let store = PgCredentialStore::new(pool);
    store
        .ensure_schema()
        .await
        .context("스키마 초기화 실패")?;

    let auth = AuthService::new(Arc::new(store), signing_key);
    let state = Arc::new(AppState::new(auth));

    let app = create_api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.server.request_timeout_secs),
        ));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("{} 바인딩 실패", addr))?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("서버 실행 실패")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 반환합니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
