//! 자격증명 저장소 추상화.
//!
//! 사용자 계정과 역할 정의를 영속화하는 저장소 인터페이스입니다.
//! 인증 서비스는 이 trait만을 통해 저장소에 접근합니다.

use async_trait::async_trait;
use uuid::Uuid;

use super::{NewUserAccount, UserAccount};
use crate::error::StoreResult;

/// 자격증명 저장소 trait.
///
/// 사용자명 인자는 모두 정규화된 값(`normalize_username`)이어야 합니다.
/// 구현체는 정규화된 사용자명의 유일성을 원자적으로 보장해야 하며,
/// 중복 생성 시 `StoreError::Conflict`를 반환해야 합니다.
///
/// # 구현 예시
///
/// ```ignore
/// pub struct PgCredentialStore {
///     pool: PgPool,
/// }
///
/// #[async_trait]
/// impl CredentialStore for PgCredentialStore {
///     async fn find_by_username(&self, normalized: &str) -> StoreResult<Option<UserAccount>> {
///         // SELECT ... WHERE normalized_username = $1
///     }
///
///     // ... 나머지 메서드 구현
/// }
/// ```
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// 정규화된 사용자명으로 계정 조회.
    async fn find_by_username(&self, normalized_username: &str)
        -> StoreResult<Option<UserAccount>>;

    /// 정규화된 사용자명 존재 여부.
    async fn exists_by_username(&self, normalized_username: &str) -> StoreResult<bool>;

    /// 계정 생성.
    ///
    /// # Errors
    ///
    /// - `StoreError::Conflict`: 정규화된 사용자명이 이미 존재
    /// - `StoreError::Storage`: 연결/쿼리 실패
    async fn create_user(&self, new_user: NewUserAccount) -> StoreResult<UserAccount>;

    /// 역할 존재 여부.
    async fn role_exists(&self, name: &str) -> StoreResult<bool>;

    /// 역할 생성.
    ///
    /// 동시에 같은 이름으로 생성되더라도 에러가 아니어야 합니다.
    async fn create_role(&self, name: &str) -> StoreResult<()>;

    /// 계정에 역할 할당.
    async fn assign_role(&self, user_id: Uuid, role_name: &str) -> StoreResult<()>;

    /// 계정에 할당된 역할 목록 (할당 순).
    async fn roles_for_user(&self, user_id: Uuid) -> StoreResult<Vec<String>>;

    /// ID로 계정 조회.
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<UserAccount>>;

    /// 전체 계정 목록 (사용자명 순).
    async fn list_users(&self) -> StoreResult<Vec<UserAccount>>;

    /// 계정 삭제. 삭제되었으면 `true`.
    ///
    /// 가입 도중 역할 할당이 실패했을 때 보상 트랜잭션으로만 사용합니다.
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;

    /// 저장소 연결 상태 확인.
    async fn ping(&self) -> StoreResult<()>;
}
