//! 자격 증명 에러 타입

use lega_e2e_core::error::{CredentialError, HarnessError};
use lega_e2e_docker::DockerError;

/// 자격 증명 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    /// trace 파일을 읽을 수 없음
    #[error("failed to read trace file {path}: {reason}")]
    TraceRead {
        /// trace 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// trace 파일에 필요한 항목이 없음
    #[error("property '{0}' not found in trace file")]
    PropertyMissing(String),

    /// CEGA 사용자 디렉토리 접근 실패
    #[error("cega users directory {path}: {reason}")]
    UserDirectory {
        /// 디렉토리 또는 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 키 생성 실패
    #[error("key generation failed for user '{user}': {reason}")]
    KeyGeneration {
        /// 대상 사용자
        user: String,
        /// 실패 사유
        reason: String,
    },

    /// 하위 Docker 에러
    #[error(transparent)]
    Docker(#[from] DockerError),
}

impl From<CredentialsError> for HarnessError {
    fn from(err: CredentialsError) -> Self {
        match err {
            CredentialsError::TraceRead { path, reason } => {
                HarnessError::Credential(CredentialError::TraceRead { path, reason })
            }
            CredentialsError::PropertyMissing(key) => {
                HarnessError::Credential(CredentialError::PropertyMissing(key))
            }
            CredentialsError::UserDirectory { .. } => {
                HarnessError::Credential(CredentialError::UserDirectory(err.to_string()))
            }
            CredentialsError::KeyGeneration { user, reason } => {
                HarnessError::Credential(CredentialError::KeyGeneration { user, reason })
            }
            CredentialsError::Docker(e) => e.into(),
        }
    }
}
