//! User Repository
//!
//! PostgreSQL 기반 자격증명 저장소입니다.
//! 사용자명 유일성은 `normalized_username` 유니크 인덱스로 보장하며,
//! 사전 존재 검사는 보조 수단일 뿐입니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use ecommerce_core::{CredentialStore, NewUserAccount, StoreError, StoreResult, UserAccount};

// ================================================================================================
// Schema
// ================================================================================================

/// 스키마 부트스트랩 구문. 순서대로 실행됩니다.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS app_users (
        id UUID PRIMARY KEY,
        username TEXT NOT NULL,
        normalized_username TEXT NOT NULL,
        display_name TEXT,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS ux_app_users_normalized_username
        ON app_users (normalized_username)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS app_roles (
        name TEXT PRIMARY KEY,
        normalized_name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS ux_app_roles_normalized_name
        ON app_roles (normalized_name)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS app_user_roles (
        user_id UUID NOT NULL REFERENCES app_users(id) ON DELETE CASCADE,
        role_name TEXT NOT NULL REFERENCES app_roles(name),
        assigned_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp(),
        PRIMARY KEY (user_id, role_name)
    )
    "#,
];

/// 계정 조회 컬럼. 역할은 가장 먼저 할당된 것 하나.
const USER_COLUMNS: &str = r#"
    u.id, u.username, u.display_name, u.password_hash, u.created_at,
    (
        SELECT ur.role_name FROM app_user_roles ur
        WHERE ur.user_id = u.id
        ORDER BY ur.assigned_at, ur.role_name
        LIMIT 1
    ) AS role
"#;

// ================================================================================================
// Types
// ================================================================================================

/// 사용자 레코드
#[derive(Debug, Clone, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    #[sqlx(default)]
    display_name: Option<String>,
    password_hash: String,
    created_at: DateTime<Utc>,
    #[sqlx(default)]
    role: Option<String>,
}

impl From<UserRow> for UserAccount {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            display_name: row.display_name,
            password_hash: row.password_hash,
            role: row.role,
            created_at: row.created_at,
        }
    }
}

fn storage_error(e: sqlx::Error) -> StoreError {
    StoreError::Storage(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

// ================================================================================================
// Repository
// ================================================================================================

/// PostgreSQL 자격증명 저장소
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 테이블과 유니크 인덱스를 생성합니다 (이미 있으면 무시).
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        for statement in SCHEMA {
            sqlx::query(*statement).execute(&self.pool).await?;
        }
        info!("Credential store schema ready");
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_username(
        &self,
        normalized_username: &str,
    ) -> StoreResult<Option<UserAccount>> {
        let sql = format!(
            "SELECT {} FROM app_users u WHERE u.normalized_username = $1",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(normalized_username)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(row.map(UserAccount::from))
    }

    async fn exists_by_username(&self, normalized_username: &str) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM app_users WHERE normalized_username = $1)",
        )
        .bind(normalized_username)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(exists)
    }

    async fn create_user(&self, new_user: NewUserAccount) -> StoreResult<UserAccount> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO app_users (id, username, normalized_username, display_name, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, display_name, password_hash, created_at, NULL::TEXT AS role
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.username)
        .bind(&new_user.normalized_username)
        .bind(&new_user.display_name)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict(new_user.normalized_username.clone())
            } else {
                storage_error(e)
            }
        })?;

        debug!(user_id = %row.id, "User row inserted");
        Ok(row.into())
    }

    async fn role_exists(&self, name: &str) -> StoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM app_roles WHERE normalized_name = $1)")
                .bind(name.to_lowercase())
                .fetch_one(&self.pool)
                .await
                .map_err(storage_error)?;

        Ok(exists)
    }

    async fn create_role(&self, name: &str) -> StoreResult<()> {
        // 동시 생성 경합은 ON CONFLICT로 흡수
        sqlx::query(
            "INSERT INTO app_roles (name, normalized_name) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(name)
        .bind(name.to_lowercase())
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn assign_role(&self, user_id: Uuid, role_name: &str) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO app_user_roles (user_id, role_name)
            SELECT $1, r.name FROM app_roles r WHERE r.normalized_name = $2
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role_name.to_lowercase())
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        if result.rows_affected() == 0 && !self.role_exists(role_name).await? {
            return Err(StoreError::Storage(format!(
                "role {} does not exist",
                role_name
            )));
        }

        Ok(())
    }

    async fn roles_for_user(&self, user_id: Uuid) -> StoreResult<Vec<String>> {
        let roles: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT role_name FROM app_user_roles
            WHERE user_id = $1
            ORDER BY assigned_at, role_name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(roles)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<UserAccount>> {
        let sql = format!("SELECT {} FROM app_users u WHERE u.id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(row.map(UserAccount::from))
    }

    async fn list_users(&self) -> StoreResult<Vec<UserAccount>> {
        let sql = format!(
            "SELECT {} FROM app_users u ORDER BY u.username",
            USER_COLUMNS
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(rows.into_iter().map(UserAccount::from).collect())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM app_users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }
}
