//! 스텝 실패 에러 타입

use lega_e2e_credentials::CredentialsError;
use lega_e2e_docker::DockerError;
use lega_e2e_inbox::InboxClientError;

/// 스텝 실행 실패
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// 앞선 스텝이 채웠어야 할 컨텍스트 값이 없음
    #[error("{0} not set")]
    NotSet(&'static str),

    /// 검증 스텝의 기대값 불일치
    #[error("assertion failed: {0}")]
    Assertion(String),

    /// Docker/DB 에러
    #[error(transparent)]
    Docker(#[from] DockerError),

    /// trace 파일, CEGA 디렉토리, 키 생성 에러
    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    /// inbox 연결 에러
    #[error(transparent)]
    Inbox(#[from] InboxClientError),
}

impl StepError {
    pub(crate) fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion(message.into())
    }
}
