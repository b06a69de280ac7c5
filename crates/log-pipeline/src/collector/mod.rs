//! 로그 수집 모듈 -- 설정된 파일을 테일링하여 레코드를 생산합니다.
//!
//! # 아키텍처
//! 파일마다 [`FileTailer`] 하나가 자체 tokio 태스크에서 실행되며,
//! 파싱된 레코드는 `mpsc::Sender<LogRecord>`로, 라인 에러와 시작 실패는
//! `mpsc::Sender<LogPipelineError>`로 전달합니다.
//!
//! 생산자끼리는 상호작용하지 않습니다. 파일 내 라인 순서는 보존되지만
//! 파일 간 순서는 보장하지 않습니다.
//!
//! [`LogPipelineError`]: crate::error::LogPipelineError

pub mod file;

pub use file::FileTailer;

use std::time::Duration;

use logconv_core::config::TailConfig;

/// 테일링 동작 옵션
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailOptions {
    /// 파일이 없으면 즉시 실패
    pub must_exist: bool,
    /// EOF 이후에도 새 라인을 계속 감시
    pub follow: bool,
    /// 파일 증가/생성 확인 주기
    pub poll_interval: Duration,
}

impl TailOptions {
    /// core 설정의 `[tail]` 섹션에서 옵션을 생성합니다.
    pub fn from_config(config: &TailConfig) -> Self {
        Self {
            must_exist: config.must_exist,
            follow: config.follow,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }
}

impl Default for TailOptions {
    fn default() -> Self {
        Self::from_config(&TailConfig::default())
    }
}

/// 생산자 하나의 실행 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TailSummary {
    /// 읽은 라인 수
    pub lines: u64,
    /// 채널로 보낸 레코드 수
    pub records: u64,
    /// 파싱에 실패한 라인 수
    pub parse_errors: u64,
}
