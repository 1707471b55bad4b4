//! 비밀번호 해싱 정책.
//!
//! Argon2id (m=19456 KiB, t=2, p=1) PHC 문자열을 저장합니다.
//! 호출마다 새 솔트를 쓰므로 같은 비밀번호라도 해시는 매번 다릅니다.
//! CPU 집약 작업이므로 async 컨텍스트에서는 `spawn_blocking` 안에서 호출합니다.

use std::sync::LazyLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// 비밀번호 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("비밀번호 해싱 실패: {0}")]
    Hashing(String),
    #[error("비밀번호가 일치하지 않습니다")]
    Mismatch,
    #[error("저장된 해시를 해석할 수 없습니다")]
    MalformedHash,
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params =
        Params::new(19_456, 2, 1, None).map_err(|e| PasswordError::Hashing(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// 평문 비밀번호를 PHC 형식 해시로 변환.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hashing(e.to_string()))
}

/// 저장된 해시와 비밀번호 비교.
///
/// 해시에 기록된 파라미터로 검증하므로 정책이 바뀌어도 기존 해시는 유효합니다.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<(), PasswordError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| PasswordError::MalformedHash)?;

    hasher()?
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| PasswordError::Mismatch)
}

/// 존재하지 않는 사용자 로그인에 쓰는 고정 해시. 같은 파라미터로 한 번만 생성합니다.
static DECOY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("decoy-password-never-matches").ok());

/// 고정 해시로 검증하여 실제 검증과 같은 비용을 치릅니다.
///
/// 존재하지 않는 사용자 경로에서 호출하며 결과는 호출 측에서 무시합니다.
pub fn verify_against_decoy(password: &str) -> Result<(), PasswordError> {
    match DECOY_HASH.as_deref() {
        Some(hash) => verify_password(password, hash),
        None => Err(PasswordError::Hashing("decoy hash unavailable".to_string())),
    }
}
