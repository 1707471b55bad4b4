//! 저장소 계층의 에러 타입.

use thiserror::Error;

/// 자격증명 저장소 에러.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 정규화된 사용자명이 이미 존재함 (유니크 제약 위반)
    #[error("이미 존재하는 사용자명: {0}")]
    Conflict(String),

    /// 연결/쿼리/제약 조건 실패
    #[error("저장소 에러: {0}")]
    Storage(String),
}

/// 저장소 작업을 위한 Result 타입.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// 유니크 제약 충돌인지 확인합니다.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_conflict() {
        assert!(StoreError::Conflict("alice".to_string()).is_conflict());
        assert!(!StoreError::Storage("connection refused".to_string()).is_conflict());
    }
}
