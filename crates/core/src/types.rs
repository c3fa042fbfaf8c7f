//! 도메인 타입 -- 하네스 크레이트가 공유하는 데이터 구조

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Docker 컨테이너 요약 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    /// 컨테이너 ID
    pub id: String,
    /// Docker가 보고하는 이름 목록 (`/ega_db` 형식)
    pub names: Vec<String>,
    /// 이미지 이름
    pub image: String,
    /// 상태 (running, exited, ...)
    pub state: String,
}

impl ContainerInfo {
    /// Docker 이름 규칙(`/name`)에 따라 이름이 일치하는지 확인합니다.
    pub fn has_name(&self, name: &str) -> bool {
        self.names
            .iter()
            .any(|n| n.strip_prefix('/').unwrap_or(n) == name)
    }

    /// 사람이 읽기 좋은 첫 번째 이름 (`/` 제거)
    pub fn display_name(&self) -> &str {
        self.names
            .first()
            .map(|n| n.trim_start_matches('/'))
            .unwrap_or_default()
    }

    /// 12자리 짧은 ID
    pub fn short_id(&self) -> &str {
        if self.id.len() > 12 {
            &self.id[..12]
        } else {
            &self.id
        }
    }
}

impl fmt::Display for ContainerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}, {})",
            self.short_id(),
            self.display_name(),
            self.image,
            self.state
        )
    }
}

/// 컨테이너 내부 명령 실행 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    /// 종료 코드 (Docker가 보고하지 않으면 `None`)
    pub exit_code: Option<i64>,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        matches!(self.exit_code, Some(0) | None)
    }
}

/// 호스트 경로 → 컨테이너 경로 바인드 마운트
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bind {
    pub host: PathBuf,
    pub container: String,
    pub read_only: bool,
}

impl Bind {
    pub fn new(host: impl Into<PathBuf>, container: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            container: container.into(),
            read_only: false,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

impl fmt::Display for Bind {
    /// Docker `HostConfig.Binds` 형식 (`host:container[:ro]`)
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host.display(), self.container)?;
        if self.read_only {
            write!(f, ":ro")?;
        }
        Ok(())
    }
}
