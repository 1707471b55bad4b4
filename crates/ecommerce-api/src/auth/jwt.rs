//! JWT 토큰 처리.
//!
//! 프로세스 전역 서명 키([`SigningKey`])로 HS256 토큰을 발급/검증합니다.
//! 발급자(iss)와 대상(aud)은 검증하지 않습니다.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, TokenData,
    Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 토큰 유효 시간 (시간).
pub const TOKEN_LIFETIME_HOURS: i64 = 2;

/// JWT 페이로드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// 사용자 ID
    pub id: String,
    /// 사용자 이름
    #[serde(rename = "userName")]
    pub user_name: String,
    /// 첫 번째 역할 (없으면 빈 문자열)
    pub role: String,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// `issued_at` 기준으로 Claims 생성. 만료는 발급 후 2시간.
    pub fn new(
        user_id: Uuid,
        user_name: impl Into<String>,
        role: Option<&str>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: user_id.to_string(),
            user_name: user_name.into(),
            role: role.unwrap_or_default().to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp(),
        }
    }

    /// 토큰이 만료되었는지 확인.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// 만료 시각.
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_default()
    }

    /// 특정 역할인지 확인 (대소문자 무시).
    pub fn has_role(&self, role: &str) -> bool {
        !self.role.is_empty() && self.role.eq_ignore_ascii_case(role)
    }

    /// 사용자 ID를 UUID로 파싱.
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.id).ok()
    }
}

/// JWT 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("토큰 인코딩 실패: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),
    #[error("토큰 디코딩 실패")]
    DecodingError,
    #[error("토큰이 만료되었습니다")]
    TokenExpired,
    #[error("잘못된 토큰 형식")]
    InvalidToken,
}

/// 대칭 서명 키.
///
/// 기동 시 한 번 생성되어 `Arc`로 공유되며 이후 변경되지 않습니다.
#[derive(Clone)]
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKey([REDACTED])")
    }
}

impl SigningKey {
    /// 비밀 문자열로부터 서명 키 생성.
    pub fn from_secret(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }

    /// 검증 규칙: HS256, exp 필수, iss/aud 미검증.
    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);
        validation
    }

    /// 토큰 서명.
    pub fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(JwtError::from)
    }

    /// 토큰 디코딩 및 검증.
    pub fn verify(&self, token: &str) -> Result<TokenData<Claims>, JwtError> {
        decode::<Claims>(token, &self.decoding, &Self::validation()).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::TokenExpired,
            ErrorKind::InvalidToken => JwtError::InvalidToken,
            _ => JwtError::DecodingError,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    fn key(secret: &str) -> SigningKey {
        SigningKey::from_secret(&SecretString::new(secret.to_string().into()))
    }

    #[test]
    fn test_sign_and_verify_token() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "alice", Some("Admin"), Utc::now());

        let token = key(TEST_SECRET).sign(&claims).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let decoded = key(TEST_SECRET).verify(&token).unwrap();
        assert_eq!(decoded.claims, claims);
        assert_eq!(decoded.claims.user_id(), Some(user_id));
        assert_eq!(decoded.header.alg, Algorithm::HS256);
    }

    #[test]
    fn test_expiry_is_two_hours() {
        let claims = Claims::new(Uuid::new_v4(), "alice", None, Utc::now());
        assert_eq!(claims.exp - claims.iat, 2 * 60 * 60);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_missing_role_is_empty_string() {
        let claims = Claims::new(Uuid::new_v4(), "bob", None, Utc::now());
        assert_eq!(claims.role, "");
        assert!(!claims.has_role(""));
    }

    #[test]
    fn test_claim_names_on_the_wire() {
        let claims = Claims::new(Uuid::new_v4(), "alice", Some("User"), Utc::now());
        let json = serde_json::to_value(&claims).unwrap();

        assert!(json.get("id").is_some());
        assert_eq!(json["userName"], "alice");
        assert_eq!(json["role"], "User");
        assert!(json["exp"].is_i64());
    }

    #[test]
    fn test_has_role_ignores_case() {
        let claims = Claims::new(Uuid::new_v4(), "admin", Some("Admin"), Utc::now());
        assert!(claims.has_role("admin"));
        assert!(claims.has_role("ADMIN"));
        assert!(!claims.has_role("User"));
    }

    #[test]
    fn test_expired_token_rejected() {
        // 기본 leeway(60초)보다 충분히 과거
        let issued = Utc::now() - Duration::hours(3);
        let claims = Claims::new(Uuid::new_v4(), "alice", Some("User"), issued);
        let token = key(TEST_SECRET).sign(&claims).unwrap();

        assert!(matches!(
            key(TEST_SECRET).verify(&token),
            Err(JwtError::TokenExpired)
        ));
    }

    #[test]
    fn test_invalid_token() {
        assert!(key(TEST_SECRET).verify("invalid.token.here").is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let claims = Claims::new(Uuid::new_v4(), "alice", Some("User"), Utc::now());
        let token = key(TEST_SECRET).sign(&claims).unwrap();

        let result = key("wrong-secret-key-for-testing-minimum-32-chars").verify(&token);
        assert!(result.is_err());
    }

    #[test]
    fn test_signing_key_debug_redacted() {
        assert_eq!(format!("{:?}", key(TEST_SECRET)), "SigningKey([REDACTED])");
    }
}
