//! 인증 서비스.
//!
//! 가입과 로그인을 담당합니다. 비밀번호 해싱 정책과 토큰 발급 정책은
//! 이 서비스가 소유하며, 영속화는 [`CredentialStore`]에 위임합니다.
//!
//! # 가입 순서
//!
//! 1. 입력 검증 (저장소 접근 전)
//! 2. 사전 중복 검사 (보조) → 해싱 → 계정 생성 (유니크 인덱스가 최종 판정)
//! 3. 역할 보장 (`ensure_role`) → 역할 할당
//! 4. 3단계(할당된 역할 재조회 포함) 실패 시 생성한 계정을 삭제하고 원래 에러 반환

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use validator::Validate;

use ecommerce_core::{
    normalize_username, CredentialStore, NewUserAccount, PublicUser, StoreError,
};

use super::jwt::{Claims, JwtError, SigningKey};
use super::password::{hash_password, verify_against_decoy, verify_password, PasswordError};
use super::roles::effective_role;

/// 로그인 거부 시 외부로 노출하는 단일 메시지.
///
/// 존재하지 않는 사용자와 잘못된 비밀번호를 구분하지 않습니다.
pub const LOGIN_DENIED_MESSAGE: &str = "사용자명 또는 비밀번호가 올바르지 않습니다";

/// 로그인 성공 메시지.
pub const LOGIN_SUCCESS_MESSAGE: &str = "로그인되었습니다";

/// 가입 요청.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(max = 256))]
    pub username: String,
    #[validate(length(max = 1024))]
    pub password: String,
    #[serde(default, alias = "name")]
    #[validate(length(max = 256))]
    pub display_name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub role: Option<String>,
}

/// 로그인 요청.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(max = 256))]
    pub username: String,
    #[validate(length(max = 1024))]
    pub password: String,
}

/// 로그인 성공 결과.
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    /// 서명된 JWT
    pub token: String,
    /// 공개 사용자 정보
    pub user: PublicUser,
    /// 토큰 만료 시각
    pub expires_at: DateTime<Utc>,
}

/// 로그인 거부 사유. 내부 로그 전용입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// 존재하지 않는 사용자
    UnknownUser,
    /// 비밀번호 불일치 (저장된 해시 손상 포함)
    WrongPassword,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::UnknownUser => "unknown_user",
            DenialReason::WrongPassword => "wrong_password",
        }
    }
}

/// 로그인 결과.
///
/// 인증 실패는 에러가 아닌 `Denied`로 표현됩니다.
/// 저장소/토큰 실패만 `Err(AuthError)`로 전달됩니다.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    Authenticated(LoginSuccess),
    Denied(DenialReason),
}

impl LoginOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, LoginOutcome::Authenticated(_))
    }
}

/// 인증 서비스 에러.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// 필수 입력 누락
    #[error("입력값 오류: {0}")]
    Validation(String),

    /// 정규화된 사용자명 중복
    #[error("이미 존재하는 사용자입니다: {0}")]
    DuplicateUser(String),

    /// 저장소 실패
    #[error(transparent)]
    Store(#[from] StoreError),

    /// 해싱 실패
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// 토큰 서명 실패
    #[error(transparent)]
    Token(#[from] JwtError),

    /// 블로킹 작업 실패
    #[error("내부 작업 실패: {0}")]
    Internal(String),
}

/// 인증 서비스.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    signing_key: Arc<SigningKey>,
}

impl AuthService {
    /// 저장소와 서명 키를 주입받아 생성합니다.
    pub fn new(store: Arc<dyn CredentialStore>, signing_key: Arc<SigningKey>) -> Self {
        Self { store, signing_key }
    }

    /// 토큰 검증에 사용하는 서명 키.
    pub fn signing_key(&self) -> &Arc<SigningKey> {
        &self.signing_key
    }

    /// 저장소 핸들.
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// 회원 가입.
    ///
    /// # Errors
    ///
    /// - `AuthError::Validation`: 사용자명(공백 제외) 또는 비밀번호가 비어 있음
    /// - `AuthError::DuplicateUser`: 정규화된 사용자명이 이미 존재
    /// - `AuthError::Store`: 저장소 실패 (역할 할당 실패 시 계정은 롤백됨)
    pub async fn register(&self, request: RegisterRequest) -> Result<PublicUser, AuthError> {
        let RegisterRequest {
            username,
            password,
            display_name,
            role,
        } = request;

        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::Validation("username은 필수입니다".to_string()));
        }
        if password.is_empty() {
            return Err(AuthError::Validation("password는 필수입니다".to_string()));
        }

        let normalized = normalize_username(username);
        if self.store.exists_by_username(&normalized).await? {
            debug!(username = %normalized, "Registration rejected by pre-check");
            return Err(AuthError::DuplicateUser(username.to_string()));
        }

        let password_hash = run_blocking(move || hash_password(&password)).await??;
        let display_name = display_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        let role = effective_role(role.as_deref());

        let account = match self
            .store
            .create_user(NewUserAccount::new(username, display_name, password_hash))
            .await
        {
            Ok(account) => account,
            Err(StoreError::Conflict(_)) => {
                info!(username = %normalized, "Registration lost uniqueness race");
                return Err(AuthError::DuplicateUser(username.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let assigned = match self.provision_role(account.id, &role).await {
            Ok(assigned) => assigned,
            Err(e) => {
                error!(user_id = %account.id, role = %role, error = %e, "Role assignment failed, rolling back account");
                match self.store.delete_user(account.id).await {
                    Ok(_) => warn!(user_id = %account.id, "Account rolled back"),
                    Err(rollback) => {
                        error!(user_id = %account.id, error = %rollback, "Account rollback failed")
                    }
                }
                return Err(e);
            }
        };

        info!(user_id = %account.id, role = %assigned, "User registered");

        Ok(PublicUser {
            role: assigned,
            ..PublicUser::from(&account)
        })
    }

    /// 로그인.
    ///
    /// 인증 실패는 `Ok(LoginOutcome::Denied)`로 반환합니다.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginOutcome, AuthError> {
        let LoginRequest { username, password } = request;

        if username.trim().is_empty() {
            return Err(AuthError::Validation("username은 필수입니다".to_string()));
        }
        if password.is_empty() {
            return Err(AuthError::Validation("password는 필수입니다".to_string()));
        }

        let normalized = normalize_username(&username);
        let Some(account) = self.store.find_by_username(&normalized).await? else {
            // 응답 시간으로 사용자 존재 여부가 드러나지 않도록 같은 비용의 검증 수행
            let _ = run_blocking(move || verify_against_decoy(&password)).await?;
            let reason = DenialReason::UnknownUser;
            info!(username = %normalized, reason = reason.as_str(), "Login denied");
            return Ok(LoginOutcome::Denied(reason));
        };

        let stored_hash = account.password_hash.clone();
        let verified = run_blocking(move || verify_password(&password, &stored_hash)).await?;
        if let Err(e) = verified {
            if matches!(e, PasswordError::MalformedHash) {
                warn!(user_id = %account.id, "Stored password hash is not a valid PHC string");
            }
            let reason = DenialReason::WrongPassword;
            info!(user_id = %account.id, reason = reason.as_str(), "Login denied");
            return Ok(LoginOutcome::Denied(reason));
        }

        let role = self.store.roles_for_user(account.id).await?.into_iter().next();
        let claims = Claims::new(
            account.id,
            account.username.clone(),
            role.as_deref(),
            Utc::now(),
        );
        let token = self.signing_key.sign(&claims)?;

        info!(user_id = %account.id, "Login succeeded");

        Ok(LoginOutcome::Authenticated(LoginSuccess {
            token,
            expires_at: claims.expires_at(),
            user: PublicUser {
                role: role.unwrap_or_default(),
                ..PublicUser::from(&account)
            },
        }))
    }

    /// 역할이 없으면 생성합니다. 새로 만들었으면 `true`.
    ///
    /// 여러 번 호출해도 역할은 하나만 존재합니다.
    pub async fn ensure_role(&self, name: &str) -> Result<bool, AuthError> {
        if self.store.role_exists(name).await? {
            return Ok(false);
        }
        self.store.create_role(name).await?;
        info!(role = %name, "Role created");
        Ok(true)
    }

    /// 정규화된 사용자명이 아직 사용되지 않았는지 확인.
    pub async fn is_unique_user(&self, username: &str) -> Result<bool, AuthError> {
        let exists = self
            .store
            .exists_by_username(&normalize_username(username))
            .await?;
        Ok(!exists)
    }

    /// ID로 사용자 조회.
    pub async fn get_user(&self, id: Uuid) -> Result<Option<PublicUser>, AuthError> {
        let account = self.store.find_by_id(id).await?;
        Ok(account.as_ref().map(PublicUser::from))
    }

    /// 전체 사용자 목록 (사용자명 순).
    pub async fn list_users(&self) -> Result<Vec<PublicUser>, AuthError> {
        let accounts = self.store.list_users().await?;
        Ok(accounts.iter().map(PublicUser::from).collect())
    }

    /// 역할을 보장하고 할당한 뒤, 저장소에 기록된 역할 표기를 반환합니다.
    async fn provision_role(&self, user_id: Uuid, role: &str) -> Result<String, AuthError> {
        self.ensure_role(role).await?;
        self.store.assign_role(user_id, role).await?;

        let assigned = self
            .store
            .roles_for_user(user_id)
            .await?
            .into_iter()
            .next()
            .unwrap_or_else(|| role.to_string());
        Ok(assigned)
    }
}

/// CPU 집약 작업을 블로킹 스레드 풀에서 실행.
async fn run_blocking<F, T>(f: F) -> Result<T, AuthError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))
}
