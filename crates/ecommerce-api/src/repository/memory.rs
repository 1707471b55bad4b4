//! 인메모리 자격증명 저장소.
//!
//! 테스트 및 `test-utils` 기능에서 사용합니다.
//! 쓰기 락 하나 안에서 중복 검사와 삽입을 수행하므로 유일성 보장은 원자적입니다.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use ecommerce_core::{CredentialStore, NewUserAccount, StoreError, StoreResult, UserAccount};

#[derive(Debug, Clone)]
struct StoredUser {
    account: UserAccount,
    normalized_username: String,
}

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<Uuid, StoredUser>,
    /// 소문자 이름 → 원래 표기
    roles: HashMap<String, String>,
    /// user_id → 할당 순 역할 목록 (원래 표기)
    assignments: HashMap<Uuid, Vec<String>>,
}

impl Inner {
    fn with_role(&self, stored: &StoredUser) -> UserAccount {
        let mut account = stored.account.clone();
        account.role = self
            .assignments
            .get(&account.id)
            .and_then(|roles| roles.first().cloned());
        account
    }
}

/// 인메모리 자격증명 저장소.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    inner: RwLock<Inner>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 등록된 역할 수.
    pub async fn role_count(&self) -> usize {
        self.inner.read().await.roles.len()
    }

    /// 등록된 계정 수.
    pub async fn user_count(&self) -> usize {
        self.inner.read().await.users.len()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(
        &self,
        normalized_username: &str,
    ) -> StoreResult<Option<UserAccount>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.normalized_username == normalized_username)
            .map(|u| inner.with_role(u)))
    }

    async fn exists_by_username(&self, normalized_username: &str) -> StoreResult<bool> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .any(|u| u.normalized_username == normalized_username))
    }

    async fn create_user(&self, new_user: NewUserAccount) -> StoreResult<UserAccount> {
        let mut inner = self.inner.write().await;

        if inner
            .users
            .values()
            .any(|u| u.normalized_username == new_user.normalized_username)
        {
            return Err(StoreError::Conflict(new_user.normalized_username));
        }

        let account = UserAccount {
            id: Uuid::new_v4(),
            username: new_user.username,
            display_name: new_user.display_name,
            password_hash: new_user.password_hash,
            role: None,
            created_at: Utc::now(),
        };

        inner.users.insert(
            account.id,
            StoredUser {
                account: account.clone(),
                normalized_username: new_user.normalized_username,
            },
        );

        Ok(account)
    }

    async fn role_exists(&self, name: &str) -> StoreResult<bool> {
        let inner = self.inner.read().await;
        Ok(inner.roles.contains_key(&name.to_lowercase()))
    }

    async fn create_role(&self, name: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .roles
            .entry(name.to_lowercase())
            .or_insert_with(|| name.to_string());
        Ok(())
    }

    async fn assign_role(&self, user_id: Uuid, role_name: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;

        if !inner.users.contains_key(&user_id) {
            return Err(StoreError::Storage(format!("user {} does not exist", user_id)));
        }

        let canonical = inner
            .roles
            .get(&role_name.to_lowercase())
            .cloned()
            .ok_or_else(|| StoreError::Storage(format!("role {} does not exist", role_name)))?;

        let roles = inner.assignments.entry(user_id).or_default();
        if !roles.contains(&canonical) {
            roles.push(canonical);
        }

        Ok(())
    }

    async fn roles_for_user(&self, user_id: Uuid) -> StoreResult<Vec<String>> {
        let inner = self.inner.read().await;
        Ok(inner.assignments.get(&user_id).cloned().unwrap_or_default())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<UserAccount>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).map(|u| inner.with_role(u)))
    }

    async fn list_users(&self) -> StoreResult<Vec<UserAccount>> {
        let inner = self.inner.read().await;
        let mut users: Vec<UserAccount> = inner.users.values().map(|u| inner.with_role(u)).collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        inner.assignments.remove(&id);
        Ok(inner.users.remove(&id).is_some())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecommerce_core::normalize_username;

    fn new_user(username: &str) -> NewUserAccount {
        NewUserAccount::new(username, None, "hash")
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = InMemoryCredentialStore::new();
        let created = store.create_user(new_user("Alice")).await.unwrap();

        let found = store
            .find_by_username(&normalize_username("ALICE "))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.username, "Alice");
        assert!(store.exists_by_username("alice").await.unwrap());
        assert!(!store.exists_by_username("bob").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_user_conflict() {
        let store = InMemoryCredentialStore::new();
        store.create_user(new_user("Alice")).await.unwrap();

        let result = store.create_user(new_user("alice ")).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_roles_are_case_insensitive_and_idempotent() {
        let store = InMemoryCredentialStore::new();
        store.create_role("Admin").await.unwrap();
        store.create_role("admin").await.unwrap();

        assert_eq!(store.role_count().await, 1);
        assert!(store.role_exists("ADMIN").await.unwrap());

        let user = store.create_user(new_user("root")).await.unwrap();
        store.assign_role(user.id, "admin").await.unwrap();
        store.assign_role(user.id, "Admin").await.unwrap();

        assert_eq!(store.roles_for_user(user.id).await.unwrap(), vec!["Admin"]);
        let found = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(found.role.as_deref(), Some("Admin"));
    }

    #[tokio::test]
    async fn test_assign_unknown_role_fails() {
        let store = InMemoryCredentialStore::new();
        let user = store.create_user(new_user("carol")).await.unwrap();

        let result = store.assign_role(user.id, "Ghost").await;
        assert!(matches!(result, Err(StoreError::Storage(_))));
    }

    #[tokio::test]
    async fn test_list_users_sorted_and_delete() {
        let store = InMemoryCredentialStore::new();
        let zed = store.create_user(new_user("zed")).await.unwrap();
        store.create_user(new_user("amy")).await.unwrap();

        let names: Vec<String> = store
            .list_users()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["amy", "zed"]);

        assert!(store.delete_user(zed.id).await.unwrap());
        assert!(!store.delete_user(zed.id).await.unwrap());
        assert_eq!(store.user_count().await, 1);
    }
}
