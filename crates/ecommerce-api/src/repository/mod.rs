//! Repository pattern for database operations.
//!
//! [`CredentialStore`](ecommerce_core::CredentialStore) 구현체를 제공합니다.
//! 운영 환경은 PostgreSQL, 테스트는 인메모리 저장소를 사용합니다.

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod users;

#[cfg(any(test, feature = "test-utils"))]
pub use memory::InMemoryCredentialStore;
pub use users::PgCredentialStore;
