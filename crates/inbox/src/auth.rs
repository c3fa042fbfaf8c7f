//! 인증 시도 정책
//!
//! 공개 키 로그인은 설정된 횟수만큼 **항상** 순서대로 시도하며, 마지막 시도의
//! 결과가 최종 결과가 됩니다. 앞선 시도가 성공했더라도 다음 시도 전에 세션을
//! 닫기 때문에, 최종 세션은 마지막 시도가 성공했을 때만 남습니다.
//!
//! inbox 서버는 새로 만든 계정의 첫 공개 키 인증을 간헐적으로 거부하므로
//! 기본값은 2회입니다. 비밀번호 로그인은 한 번만 시도합니다.

use std::path::Path;

use tracing::{error, info, warn};

use lega_e2e_core::config::InboxConfig;

use crate::client::{InboxConnector, InboxSession};
use crate::error::InboxClientError;

/// 기본 공개 키 인증 시도 횟수
pub const DEFAULT_AUTH_ATTEMPTS: u32 = 2;

/// 인증 시도 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthPolicy {
    /// 공개 키 인증 시도 횟수 (1 이상)
    pub attempts: u32,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_AUTH_ATTEMPTS,
        }
    }
}

impl AuthPolicy {
    pub fn from_config(config: &InboxConfig) -> Self {
        Self {
            attempts: config.auth_attempts.max(1),
        }
    }
}

/// 한 번의 인증 시도 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptResult {
    /// 1부터 시작하는 시도 번호
    pub attempt: u32,
    /// 실패 시 에러
    pub error: Option<InboxClientError>,
}

impl AttemptResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// 공개 키 인증 최종 결과
#[derive(Debug)]
pub struct AuthOutcome<S> {
    /// 마지막 시도가 성공했을 때의 세션
    pub session: Option<S>,
    /// 마지막 시도가 실패했는지 여부
    pub failed: bool,
    /// 시도별 결과 (시도 순서)
    pub attempts: Vec<AttemptResult>,
}

impl<S> AuthOutcome<S> {
    /// 마지막 시도의 에러
    pub fn last_error(&self) -> Option<&InboxClientError> {
        self.attempts.last().and_then(|a| a.error.as_ref())
    }
}

/// 정책에 따라 inbox 로그인을 수행합니다.
pub struct Authenticator<C: InboxConnector> {
    connector: C,
    policy: AuthPolicy,
}

impl<C: InboxConnector> Authenticator<C> {
    pub fn new(connector: C, policy: AuthPolicy) -> Self {
        Self { connector, policy }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn policy(&self) -> AuthPolicy {
        self.policy
    }

    /// 공개 키 로그인을 정책 횟수만큼 시도합니다.
    ///
    /// 실패는 `error!`로 기록하고 다음 시도로 넘어갑니다. 이 메서드 자체는
    /// 실패하지 않으며, 결과는 [`AuthOutcome::failed`]로 판단합니다.
    pub async fn authenticate_with_key(&self, user: &str, key: &Path) -> AuthOutcome<C::Session> {
        let attempts_total = self.policy.attempts.max(1);
        let mut session: Option<C::Session> = None;
        let mut attempts = Vec::with_capacity(attempts_total as usize);

        for attempt in 1..=attempts_total {
            if let Some(previous) = session.take() {
                close_quietly(previous).await;
            }

            match self.connector.connect_with_key(user, key).await {
                Ok(s) => {
                    info!(user = %user, attempt, "public key authentication succeeded");
                    session = Some(s);
                    attempts.push(AttemptResult {
                        attempt,
                        error: None,
                    });
                }
                Err(e) => {
                    error!(user = %user, attempt, error = %e, "public key authentication failed");
                    attempts.push(AttemptResult {
                        attempt,
                        error: Some(e),
                    });
                }
            }
        }

        AuthOutcome {
            failed: session.is_none(),
            session,
            attempts,
        }
    }

    /// 비밀번호 로그인을 한 번 시도합니다.
    pub async fn authenticate_with_password(
        &self,
        user: &str,
        password: &str,
    ) -> Result<C::Session, InboxClientError> {
        match self.connector.connect_with_password(user, password).await {
            Ok(session) => {
                info!(user = %user, "password authentication succeeded");
                Ok(session)
            }
            Err(e) => {
                error!(user = %user, error = %e, "password authentication failed");
                Err(e)
            }
        }
    }
}

async fn close_quietly<S: InboxSession>(session: S) {
    if let Err(e) = session.close().await {
        warn!(error = %e, "failed to close previous inbox session");
    }
}
