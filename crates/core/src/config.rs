//! 설정 관리 -- lega-e2e.toml 파싱 및 런타임 설정
//!
//! [`HarnessConfig`]는 하네스 전체 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LEGA_E2E_INBOX_PORT=2222` 형식)
//! 3. 설정 파일 (`lega-e2e.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), lega_e2e_core::error::HarnessError> {
//! use lega_e2e_core::config::HarnessConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = HarnessConfig::load("lega-e2e.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = HarnessConfig::parse("[inbox]\nport = 2222")?;
//! # Ok(())
//! # }
//! ```

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, HarnessError};

/// 설정 상한/하한 상수
const MAX_AUTH_ATTEMPTS: u32 = 10;
const MAX_CONNECT_TIMEOUT_SECS: u64 = 300;
const MIN_KEY_BITS: u32 = 1024;

/// 하네스 통합 설정
///
/// `lega-e2e.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 파일 경로 설정
    #[serde(default)]
    pub paths: PathsConfig,
    /// Docker 설정
    #[serde(default)]
    pub docker: DockerConfig,
    /// 로컬 데이터베이스 설정
    #[serde(default)]
    pub database: DatabaseConfig,
    /// SFTP inbox 설정
    #[serde(default)]
    pub inbox: InboxConfig,
    /// 자격 증명 설정
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

impl HarnessConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, HarnessError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일이 없으면 기본값에 환경변수만 적용합니다.
    ///
    /// Cucumber 러너처럼 설정 파일이 선택 사항인 경우에 사용합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, HarnessError> {
        let path = path.as_ref();
        let mut config = match Self::from_file(path).await {
            Ok(config) => config,
            Err(HarnessError::Config(ConfigError::FileNotFound { .. })) => Self::default(),
            Err(e) => return Err(e),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, HarnessError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                HarnessError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                HarnessError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, HarnessError> {
        toml::from_str(toml_str).map_err(|e| {
            HarnessError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LEGA_E2E_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LEGA_E2E_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LEGA_E2E_GENERAL_LOG_FORMAT");

        // Paths
        override_path(&mut self.paths.project_root, "LEGA_E2E_PATHS_PROJECT_ROOT");
        override_path(&mut self.paths.trace_file, "LEGA_E2E_PATHS_TRACE_FILE");
        override_path(
            &mut self.paths.legacy_trace_file,
            "LEGA_E2E_PATHS_LEGACY_TRACE_FILE",
        );
        override_path(
            &mut self.paths.cega_users_dir,
            "LEGA_E2E_PATHS_CEGA_USERS_DIR",
        );
        override_path(&mut self.paths.gpg_dir, "LEGA_E2E_PATHS_GPG_DIR");

        // Docker
        override_string(&mut self.docker.socket, "LEGA_E2E_DOCKER_SOCKET");
        override_string(&mut self.docker.worker_image, "LEGA_E2E_DOCKER_WORKER_IMAGE");
        override_string(&mut self.docker.db_image, "LEGA_E2E_DOCKER_DB_IMAGE");
        override_string(&mut self.docker.db_container, "LEGA_E2E_DOCKER_DB_CONTAINER");
        override_string(&mut self.docker.gpg_mount, "LEGA_E2E_DOCKER_GPG_MOUNT");
        override_u64(
            &mut self.docker.keepalive_secs,
            "LEGA_E2E_DOCKER_KEEPALIVE_SECS",
        );

        // Database
        override_string(
            &mut self.database.user_trace_key,
            "LEGA_E2E_DATABASE_USER_TRACE_KEY",
        );
        override_string(&mut self.database.name, "LEGA_E2E_DATABASE_NAME");
        override_string(&mut self.database.expiration, "LEGA_E2E_DATABASE_EXPIRATION");
        override_u64(
            &mut self.database.expire_delay_ms,
            "LEGA_E2E_DATABASE_EXPIRE_DELAY_MS",
        );

        // Inbox
        override_string(&mut self.inbox.host, "LEGA_E2E_INBOX_HOST");
        override_u16(&mut self.inbox.port, "LEGA_E2E_INBOX_PORT");
        override_u32(&mut self.inbox.auth_attempts, "LEGA_E2E_INBOX_AUTH_ATTEMPTS");
        override_u64(
            &mut self.inbox.connect_timeout_secs,
            "LEGA_E2E_INBOX_CONNECT_TIMEOUT_SECS",
        );
        override_string(&mut self.inbox.root_entry, "LEGA_E2E_INBOX_ROOT_ENTRY");

        // Credentials
        override_u32(&mut self.credentials.key_bits, "LEGA_E2E_CREDENTIALS_KEY_BITS");
        override_string(
            &mut self.credentials.incorrect_key_user,
            "LEGA_E2E_CREDENTIALS_INCORRECT_KEY_USER",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), HarnessError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        for (field, value) in [
            ("docker.worker_image", &self.docker.worker_image),
            ("docker.db_image", &self.docker.db_image),
            ("docker.db_container", &self.docker.db_container),
            ("database.user_trace_key", &self.database.user_trace_key),
            ("database.name", &self.database.name),
            ("inbox.host", &self.inbox.host),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(field, "must not be empty".to_owned()));
            }
        }

        if self.inbox.port == 0 {
            return Err(invalid("inbox.port", "must not be 0".to_owned()));
        }

        if self.inbox.auth_attempts == 0 || self.inbox.auth_attempts > MAX_AUTH_ATTEMPTS {
            return Err(invalid(
                "inbox.auth_attempts",
                format!("must be 1-{MAX_AUTH_ATTEMPTS}"),
            ));
        }

        if self.inbox.connect_timeout_secs == 0
            || self.inbox.connect_timeout_secs > MAX_CONNECT_TIMEOUT_SECS
        {
            return Err(invalid(
                "inbox.connect_timeout_secs",
                format!("must be 1-{MAX_CONNECT_TIMEOUT_SECS}"),
            ));
        }

        if self.credentials.key_bits < MIN_KEY_BITS {
            return Err(invalid(
                "credentials.key_bits",
                format!("must be at least {MIN_KEY_BITS}"),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> HarnessError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 파일 경로 설정
///
/// 상대 경로는 모두 `project_root` 기준으로 해석됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// LocalEGA 저장소 루트 (테스트는 보통 `tests/` 하위에서 실행됨)
    pub project_root: PathBuf,
    /// 부트스트랩이 생성한 trace 파일
    pub trace_file: PathBuf,
    /// 이전 부트스트랩 레이아웃의 trace 파일 (비밀번호 로그인용)
    pub legacy_trace_file: PathBuf,
    /// CEGA 사용자 YAML 디렉토리
    pub cega_users_dir: PathBuf,
    /// worker 컨테이너에 마운트할 GPG 홈
    pub gpg_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from(".."),
            trace_file: PathBuf::from("docker/private/.trace"),
            legacy_trace_file: PathBuf::from("docker/bootstrap/private/.trace"),
            cega_users_dir: PathBuf::from("docker/bootstrap/private/cega/users"),
            gpg_dir: PathBuf::from("docker/bootstrap/private/gpg"),
        }
    }
}

impl PathsConfig {
    /// `project_root` 기준으로 경로를 해석합니다.
    ///
    /// 결과는 항상 절대 경로입니다. Docker는 상대 경로 bind 소스를 볼륨 이름으로
    /// 취급하므로, 상대 `project_root`는 현재 작업 디렉토리에 붙인 뒤 `.`과
    /// `..`을 정리합니다.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        };
        let absolute = std::path::absolute(&joined).unwrap_or(joined);
        normalize(&absolute)
    }

    pub fn trace_file(&self) -> PathBuf {
        self.resolve(&self.trace_file)
    }

    pub fn legacy_trace_file(&self) -> PathBuf {
        self.resolve(&self.legacy_trace_file)
    }

    pub fn cega_users_dir(&self) -> PathBuf {
        self.resolve(&self.cega_users_dir)
    }

    pub fn gpg_dir(&self) -> PathBuf {
        self.resolve(&self.gpg_dir)
    }
}

/// `.`과 `..` 구성 요소를 어휘적으로 제거합니다.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Docker 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerConfig {
    /// Docker 소켓 경로 (빈 문자열이면 플랫폼 기본값)
    pub socket: String,
    /// worker 이미지
    pub worker_image: String,
    /// 데이터베이스 이미지
    pub db_image: String,
    /// 데이터베이스 컨테이너 이름
    pub db_container: String,
    /// worker 내부 GPG 마운트 지점
    pub gpg_mount: String,
    /// 키 생성용 임시 worker의 수명 (초)
    pub keepalive_secs: u64,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            socket: String::new(),
            worker_image: "nbis/ega:worker".to_owned(),
            db_image: "nbis/ega:db".to_owned(),
            db_container: "ega_db".to_owned(),
            gpg_mount: "/root/.gnupg".to_owned(),
            keepalive_secs: 1000,
        }
    }
}

/// 로컬 데이터베이스 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// DB 사용자명이 기록된 trace 키
    pub user_trace_key: String,
    /// 데이터베이스 이름
    pub name: String,
    /// 계정 만료 시 설정할 interval 값
    pub expiration: String,
    /// 만료 처리 전 대기 시간 (밀리초)
    pub expire_delay_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            user_trace_key: "DB_USER".to_owned(),
            name: "lega".to_owned(),
            expiration: "1 second".to_owned(),
            expire_delay_ms: 1000,
        }
    }
}

/// SFTP inbox 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InboxConfig {
    /// inbox 호스트
    pub host: String,
    /// inbox SSH 포트
    pub port: u16,
    /// 공개 키 인증 시도 횟수 (마지막 시도 결과가 최종 결과)
    pub auth_attempts: u32,
    /// 연결 타임아웃 (초)
    pub connect_timeout_secs: u64,
    /// 로그인 직후 루트에서 기대하는 엔트리 이름
    pub root_entry: String,
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 2222,
            auth_attempts: 2,
            connect_timeout_secs: 30,
            root_entry: "inbox".to_owned(),
        }
    }
}

/// 자격 증명 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// RSA 키 길이
    pub key_bits: u32,
    /// "잘못된 개인 키" 시나리오에 사용할 기존 사용자
    pub incorrect_key_user: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            key_bits: 2048,
            incorrect_key_user: "john".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_path(target: &mut PathBuf, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = PathBuf::from(val);
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
