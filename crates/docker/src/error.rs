//! Docker 하네스 에러 타입
//!
//! [`DockerError`]는 Docker API 호출과 컨테이너 내부 명령 실행에서 발생하는
//! 에러를 표현합니다. `From<DockerError> for HarnessError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 전파할 수 있습니다.

use lega_e2e_core::error::{ContainerError, DatabaseError, HarnessError};

/// Docker 하네스 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum DockerError {
    /// Docker API 호출 실패
    #[error("docker api error: {0}")]
    DockerApi(String),

    /// Docker 소켓 연결 실패
    #[error("docker connection error: {0}")]
    DockerConnection(String),

    /// 조건에 맞는 컨테이너가 없음
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    /// 컨테이너 내부 명령 실패
    #[error("exec failed in container '{container_id}': {reason}")]
    ExecFailed {
        /// 대상 컨테이너 ID
        container_id: String,
        /// 실패 사유
        reason: String,
    },

    /// psql 쿼리 실패
    #[error("query failed: {0}")]
    Query(String),

    /// psql 출력 형식이 예상과 다름
    #[error("unexpected psql output: {0}")]
    UnexpectedOutput(String),
}

impl From<DockerError> for HarnessError {
    fn from(err: DockerError) -> Self {
        match err {
            DockerError::DockerApi(msg) => HarnessError::Container(ContainerError::Api(msg)),
            DockerError::DockerConnection(msg) => {
                HarnessError::Container(ContainerError::Connection(msg))
            }
            DockerError::ContainerNotFound(what) => {
                HarnessError::Container(ContainerError::NotFound(what))
            }
            DockerError::ExecFailed {
                container_id,
                reason,
            } => HarnessError::Container(ContainerError::ExecFailed {
                container_id,
                reason,
            }),
            DockerError::Query(msg) => HarnessError::Database(DatabaseError::Query(msg)),
            DockerError::UnexpectedOutput(msg) => {
                HarnessError::Database(DatabaseError::UnexpectedOutput(msg))
            }
        }
    }
}
