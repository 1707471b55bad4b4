//! 역할 기반 접근 제어 (RBAC).
//!
//! 역할은 고정된 열거형이 아니라 저장소에 등록되는 문자열 이름입니다.
//! 가입 시 처음 요청된 역할은 자동으로 생성됩니다.

/// 관리자 역할.
pub const ROLE_ADMIN: &str = "Admin";

/// 기본 사용자 역할.
pub const ROLE_USER: &str = "User";

/// 가입 요청의 역할을 실제 적용할 역할로 결정.
///
/// 공백을 제거한 값이 비어 있거나 없으면 [`ROLE_USER`]를 사용합니다.
pub fn effective_role(requested: Option<&str>) -> String {
    requested
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(ROLE_USER)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_role_default() {
        assert_eq!(effective_role(None), "User");
        assert_eq!(effective_role(Some("")), "User");
        assert_eq!(effective_role(Some("   ")), "User");
    }

    #[test]
    fn test_effective_role_supplied() {
        assert_eq!(effective_role(Some("Admin")), "Admin");
        assert_eq!(effective_role(Some(" Seller ")), "Seller");
    }
}
