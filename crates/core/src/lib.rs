//! LocalEGA end-to-end harness core.
//!
//! 다른 하네스 크레이트가 공유하는 에러, 설정, 도메인 타입을 정의합니다.

pub mod config;
pub mod error;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{
    ConfigError, ContainerError, CredentialError, DatabaseError, HarnessError, InboxError,
};

// 설정
pub use config::HarnessConfig;

// 도메인 타입
pub use types::{Bind, ContainerInfo, ExecOutput};
