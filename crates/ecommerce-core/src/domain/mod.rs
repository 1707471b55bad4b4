//! 도메인 모델.
//!
//! 사용자 계정과 자격증명 저장소 추상화를 정의합니다.

mod account;
mod credential_store;

pub use account::{normalize_username, NewUserAccount, PublicUser, UserAccount};
pub use credential_store::CredentialStore;
