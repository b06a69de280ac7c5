//! 로그 파이프라인 에러 타입
//!
//! [`LogPipelineError`]는 로그 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<LogPipelineError> for LogconvError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.
//!
//! 라인 단위 파싱 실패는 [`LineParseError`]로 표현하며, 생산자를 중단시키지 않습니다.

use logconv_core::error::{LogconvError, ParseError, PipelineError, StorageError};

/// 라인 파싱 실패 원인
#[derive(Debug, thiserror::Error)]
pub enum ParseErrorKind {
    /// 타임스탬프 필드와 메시지 필드를 모두 갖추지 못한 라인
    #[error("wrong log structure: expected '<timestamp> | <message>'")]
    MalformedStructure,

    /// 등록되지 않은 형식 태그
    #[error("unexpected time format '{0}'")]
    UnknownFormat(String),

    /// 타임스탬프가 형식 레이아웃과 일치하지 않음
    #[error("failed to parse log time '{value}' as format '{format}': {source}")]
    InvalidTimestamp {
        /// 타임스탬프 필드 원문
        value: String,
        /// 형식 태그
        format: String,
        /// chrono 파싱 에러
        #[source]
        source: chrono::ParseError,
    },
}

impl ParseErrorKind {
    /// 메트릭 레이블용 짧은 이름을 반환합니다.
    pub fn label(&self) -> &'static str {
        match self {
            Self::MalformedStructure => "structure",
            Self::UnknownFormat(_) => "format",
            Self::InvalidTimestamp { .. } => "timestamp",
        }
    }
}

/// 라인 하나의 파싱 실패
///
/// 어느 파일의 몇 번째 라인에서 무엇이 실패했는지 진단에 필요한 정보를 모두 담습니다.
#[derive(Debug, thiserror::Error)]
#[error("[{source_file}]: line [{line_number}] {kind}: {raw_line}")]
pub struct LineParseError {
    /// 원본 파일 경로
    pub source_file: String,
    /// 테일 스트림 내 1부터 시작하는 라인 번호
    pub line_number: u64,
    /// 문제가 된 원시 라인
    pub raw_line: String,
    /// 실패 원인
    pub kind: ParseErrorKind,
}

/// 로그 파이프라인 도메인 에러
///
/// 파싱, 테일링, 수집, 싱크, 채널 통신 등 파이프라인 내부의
/// 모든 에러 상황을 포괄합니다.
#[derive(Debug, thiserror::Error)]
pub enum LogPipelineError {
    /// 라인 파싱 실패 (생산자는 계속 진행)
    #[error("parse error: {0}")]
    Line(#[from] LineParseError),

    /// 테일링 시작 실패 (해당 생산자만 종료)
    #[error("failed to tail file [{path}]: {reason}")]
    TailStart {
        /// 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 수집기 에러 (테일링 도중 파일 I/O 등)
    #[error("collector error: {path}: {reason}")]
    Collector {
        /// 파일 경로
        path: String,
        /// 에러 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 싱크 에러
    #[error("sink error: {0}")]
    Sink(#[from] StorageError),

    /// 채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),
}

impl From<LogPipelineError> for LogconvError {
    fn from(err: LogPipelineError) -> Self {
        match err {
            LogPipelineError::Line(line) => match &line.kind {
                ParseErrorKind::UnknownFormat(tag) => {
                    LogconvError::Parse(ParseError::UnsupportedFormat(tag.clone()))
                }
                _ => LogconvError::Parse(ParseError::Failed(line.to_string())),
            },
            LogPipelineError::Channel(reason) => {
                LogconvError::Pipeline(PipelineError::ChannelSend(reason))
            }
            LogPipelineError::Sink(e) => LogconvError::Storage(e),
            other => LogconvError::Pipeline(PipelineError::InitFailed(other.to_string())),
        }
    }
}
