//! 도메인 타입 -- 시스템 전역에서 사용되는 공통 타입
//!
//! 파서가 생성하고 집계 루프가 싱크로 넘기는 [`LogRecord`]를 정의합니다.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 파싱된 로그 레코드
///
/// 원시 로그 한 줄에서 생성되며, 생성 이후에는 변경되지 않습니다.
/// 직렬화 필드명은 기존 문서 스키마(`log_time`, `log_msg`, `file_name`, `log_format`)를 따릅니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// 로그 시각 (형식 레이아웃으로 파싱, 타임존 정보가 없으면 UTC)
    #[serde(rename = "log_time")]
    pub timestamp: DateTime<Utc>,
    /// 타임스탬프 필드 이후의 메시지 (구분자 포함 원문 그대로)
    #[serde(rename = "log_msg")]
    pub message: String,
    /// 레코드가 나온 파일 경로
    #[serde(rename = "file_name")]
    pub source_file: String,
    /// 파싱에 사용한 형식 태그
    #[serde(rename = "log_format")]
    pub format: String,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}): {}",
            self.format,
            self.timestamp.format("%Y-%m-%dT%H:%M:%S"),
            self.source_file,
            self.message,
        )
    }
}
