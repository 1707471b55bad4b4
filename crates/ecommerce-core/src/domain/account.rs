//! 사용자 계정 모델.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 사용자명 정규화 (앞뒤 공백 제거 + 소문자 변환).
///
/// 로그인 키 비교와 유니크 제약은 모두 정규화된 값을 기준으로 합니다.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// 저장된 사용자 계정.
///
/// `password_hash`를 포함하므로 외부로 직렬화하지 않습니다.
/// 응답에는 [`PublicUser`]를 사용하세요.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    /// 계정 ID (생성 후 불변)
    pub id: Uuid,
    /// 사용자명 (앞뒤 공백 제거된 원본 표기)
    pub username: String,
    /// 표시 이름
    pub display_name: Option<String>,
    /// PHC 형식 비밀번호 해시
    pub password_hash: String,
    /// 첫 번째로 할당된 역할
    pub role: Option<String>,
    /// 생성 시간
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    /// 정규화된 사용자명.
    pub fn normalized_username(&self) -> String {
        normalize_username(&self.username)
    }
}

/// 신규 계정 입력.
#[derive(Debug, Clone)]
pub struct NewUserAccount {
    pub username: String,
    pub normalized_username: String,
    pub display_name: Option<String>,
    pub password_hash: String,
}

impl NewUserAccount {
    /// 사용자명을 정규화하여 신규 계정 입력을 생성합니다.
    pub fn new(
        username: &str,
        display_name: Option<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            username: username.trim().to_string(),
            normalized_username: normalize_username(username),
            display_name,
            password_hash: password_hash.into(),
        }
    }
}

/// 외부 공개용 사용자 정보.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    /// 역할이 없으면 빈 문자열
    pub role: String,
}

impl From<&UserAccount> for PublicUser {
    fn from(account: &UserAccount) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            display_name: account.display_name.clone(),
            role: account.role.clone().unwrap_or_default(),
        }
    }
}
