//! 에러 타입 -- 도메인별 에러 정의

/// logconv 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LogconvError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 파싱 에러
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// 스토리지(싱크) 에러
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

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

/// 파이프라인 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 채널 전송 실패
    #[error("channel send failed: {0}")]
    ChannelSend(String),

    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),

    /// 이미 실행 중
    #[error("pipeline is already running")]
    AlreadyRunning,

    /// 실행 중이 아님
    #[error("pipeline is not running")]
    NotRunning,
}

/// 파싱 에러
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// 등록되지 않은 형식
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// 파싱 실패
    #[error("parse failed: {0}")]
    Failed(String),
}

/// 스토리지(싱크) 에러
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// 싱크 열기 실패 (시작 시점에서는 치명적)
    #[error("failed to open sink '{target}': {reason}")]
    Open { target: String, reason: String },

    /// 레코드 저장 실패
    #[error("failed to store record: {0}")]
    Write(String),

    /// 싱크 닫기 실패
    #[error("failed to close sink: {0}")]
    Close(String),

    /// 이미 닫힌 싱크에 접근
    #[error("sink is closed")]
    Closed,

    /// 저장 시간 초과
    #[error("store timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_converts_to_top_level() {
        let err: LogconvError = StorageError::Closed.into();
        assert!(matches!(err, LogconvError::Storage(StorageError::Closed)));
        assert!(err.to_string().contains("sink is closed"));
    }

    #[test]
    fn config_error_display_names_field() {
        let err = ConfigError::InvalidValue {
            field: "tail.poll_interval_ms".to_owned(),
            reason: "must be 1-60000".to_owned(),
        };
        assert!(err.to_string().contains("tail.poll_interval_ms"));
    }

    #[test]
    fn timeout_error_display() {
        let err = StorageError::Timeout { timeout_ms: 1500 };
        assert_eq!(err.to_string(), "store timed out after 1500ms");
    }
}
