//! 에러 타입 -- 도메인별 에러 정의

/// 하네스 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Docker 컨테이너 관련 에러
    #[error("container error: {0}")]
    Container(#[from] ContainerError),

    /// 테스트 자격 증명 관련 에러
    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),

    /// SFTP inbox 관련 에러
    #[error("inbox error: {0}")]
    Inbox(#[from] InboxError),

    /// 로컬 데이터베이스 관련 에러
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Docker 컨테이너 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// Docker API 호출 실패
    #[error("docker api error: {0}")]
    Api(String),

    /// Docker 데몬 연결 실패
    #[error("docker connection error: {0}")]
    Connection(String),

    /// 컨테이너를 찾을 수 없음
    #[error("container not found: {0}")]
    NotFound(String),

    /// 컨테이너 내부 명령 실행 실패
    #[error("exec failed in container '{container_id}': {reason}")]
    ExecFailed {
        container_id: String,
        reason: String,
    },
}

/// 자격 증명 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// trace 파일 읽기 실패
    #[error("failed to read trace file {path}: {reason}")]
    TraceRead { path: String, reason: String },

    /// trace 파일에 필요한 항목이 없음
    #[error("property '{0}' not found in trace file")]
    PropertyMissing(String),

    /// CEGA 사용자 디렉토리 접근 실패
    #[error("cega users directory error: {0}")]
    UserDirectory(String),

    /// 키 쌍 생성 실패
    #[error("key generation failed for user '{user}': {reason}")]
    KeyGeneration { user: String, reason: String },
}

/// SFTP inbox 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum InboxError {
    /// SSH 연결 실패
    #[error("connect to {addr} failed: {reason}")]
    Connect { addr: String, reason: String },

    /// 서버가 인증을 거부함
    #[error("authentication rejected for user '{0}'")]
    Rejected(String),

    /// 개인 키 로딩 실패
    #[error("cannot load private key {path}: {reason}")]
    Key { path: String, reason: String },

    /// SFTP 서브시스템 에러
    #[error("sftp error: {0}")]
    Sftp(String),

    /// 연결 타임아웃
    #[error("timed out after {0}s")]
    Timeout(u64),
}

/// 로컬 데이터베이스 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// 쿼리 실행 실패
    #[error("query failed: {0}")]
    Query(String),

    /// psql 출력 해석 실패
    #[error("unexpected psql output: {0}")]
    UnexpectedOutput(String),
}
