//! inbox 클라이언트 에러 타입

use lega_e2e_core::error::{HarnessError, InboxError};

/// inbox 클라이언트 도메인 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InboxClientError {
    /// TCP 연결 또는 SSH 핸드셰이크 실패
    #[error("connect to {addr} failed: {reason}")]
    Connect {
        /// 대상 주소 (`host:port`)
        addr: String,
        /// 실패 사유
        reason: String,
    },

    /// 서버가 인증을 거부함
    #[error("authentication rejected for user '{0}'")]
    Rejected(String),

    /// 개인 키를 읽을 수 없음
    #[error("cannot load private key {path}: {reason}")]
    Key {
        /// 키 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// SFTP 채널/서브시스템 에러
    #[error("sftp error: {0}")]
    Sftp(String),

    /// 연결 타임아웃 (초)
    #[error("connect timed out after {0}s")]
    Timeout(u64),
}

impl InboxClientError {
    /// 서버가 자격 증명을 거부한 경우인지 여부
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

impl From<InboxClientError> for HarnessError {
    fn from(err: InboxClientError) -> Self {
        let inner = match err {
            InboxClientError::Connect { addr, reason } => InboxError::Connect { addr, reason },
            InboxClientError::Rejected(user) => InboxError::Rejected(user),
            InboxClientError::Key { path, reason } => InboxError::Key { path, reason },
            InboxClientError::Sftp(msg) => InboxError::Sftp(msg),
            InboxClientError::Timeout(secs) => InboxError::Timeout(secs),
        };
        HarnessError::Inbox(inner)
    }
}
