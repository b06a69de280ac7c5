//! 로그 파이프라인 설정
//!
//! [`PipelineConfig`]는 core의 [`LogconvConfig`](logconv_core::config::LogconvConfig)에서
//! 파이프라인 실행에 필요한 부분(파일 목록, 테일 옵션, 채널/저장 설정)만 추려 제공합니다.
//!
//! # 사용 예시
//! ```
//! use logconv_pipeline::config::PipelineConfigBuilder;
//!
//! let config = PipelineConfigBuilder::new()
//!     .file("/var/log/app.log", "first")
//!     .follow(false)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.files.len(), 1);
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use logconv_core::config::{LogconvConfig, PipelineSection, TailConfig};

use crate::collector::TailOptions;
use crate::error::LogPipelineError;
use crate::parser::format;

const MAX_POLL_INTERVAL_MS: u64 = 60_000;
const MAX_CHANNEL_CAPACITY: usize = 1_000_000;

/// 로그 파이프라인 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 파일 경로 -> 형식 태그
    pub files: BTreeMap<String, String>,
    /// 파일이 없으면 해당 생산자 시작 실패
    pub must_exist: bool,
    /// EOF 이후에도 계속 감시
    pub follow: bool,
    /// 폴링 주기 (밀리초)
    pub poll_interval_ms: u64,
    /// 레코드/에러 채널 용량
    pub channel_capacity: usize,
    /// 저장 한 건의 시간 제한 (밀리초, 0이면 제한 없음)
    pub store_timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let tail = TailConfig::default();
        let pipeline = PipelineSection::default();
        Self {
            files: BTreeMap::new(),
            must_exist: tail.must_exist,
            follow: tail.follow,
            poll_interval_ms: tail.poll_interval_ms,
            channel_capacity: pipeline.channel_capacity,
            store_timeout_ms: pipeline.store_timeout_ms,
        }
    }
}

impl PipelineConfig {
    /// core 설정에서 파이프라인 설정을 생성합니다.
    pub fn from_core(core: &LogconvConfig) -> Self {
        Self {
            files: core.files.clone(),
            must_exist: core.tail.must_exist,
            follow: core.tail.follow,
            poll_interval_ms: core.tail.poll_interval_ms,
            channel_capacity: core.pipeline.channel_capacity,
            store_timeout_ms: core.pipeline.store_timeout_ms,
        }
    }

    /// 생산자에 전달할 테일 옵션을 반환합니다.
    pub fn tail_options(&self) -> TailOptions {
        TailOptions {
            must_exist: self.must_exist,
            follow: self.follow,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    /// 저장 시간 제한을 반환합니다 (`store_timeout_ms == 0`이면 `None`).
    pub fn store_timeout(&self) -> Option<Duration> {
        (self.store_timeout_ms > 0).then(|| Duration::from_millis(self.store_timeout_ms))
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 등록되지 않은 형식 태그는 시작 전에 거부합니다.
    pub fn validate(&self) -> Result<(), LogPipelineError> {
        if self.files.is_empty() {
            return Err(config_error("files", "at least one file must be configured"));
        }

        for (path, tag) in &self.files {
            if path.is_empty() {
                return Err(config_error("files", "file path must not be empty"));
            }
            if !format::is_registered(tag) {
                return Err(config_error(
                    "files",
                    format!(
                        "unknown format '{tag}' for '{path}' (registered: {})",
                        format::registered_tags().join(", ")
                    ),
                ));
            }
        }

        if self.poll_interval_ms == 0 || self.poll_interval_ms > MAX_POLL_INTERVAL_MS {
            return Err(config_error(
                "poll_interval_ms",
                format!("must be 1-{MAX_POLL_INTERVAL_MS}"),
            ));
        }

        if self.channel_capacity == 0 || self.channel_capacity > MAX_CHANNEL_CAPACITY {
            return Err(config_error(
                "channel_capacity",
                format!("must be 1-{MAX_CHANNEL_CAPACITY}"),
            ));
        }

        Ok(())
    }
}

fn config_error(field: &str, reason: impl Into<String>) -> LogPipelineError {
    LogPipelineError::Config {
        field: field.to_owned(),
        reason: reason.into(),
    }
}

/// 파이프라인 설정 빌더
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 감시할 파일과 형식 태그를 추가합니다.
    pub fn file(mut self, path: impl Into<String>, format: impl Into<String>) -> Self {
        self.config.files.insert(path.into(), format.into());
        self
    }

    /// 파일 존재 필수 여부를 설정합니다.
    pub fn must_exist(mut self, must_exist: bool) -> Self {
        self.config.must_exist = must_exist;
        self
    }

    /// follow 모드를 설정합니다.
    pub fn follow(mut self, follow: bool) -> Self {
        self.config.follow = follow;
        self
    }

    /// 폴링 주기(밀리초)를 설정합니다.
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// 채널 용량을 설정합니다.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.channel_capacity = capacity;
        self
    }

    /// 저장 시간 제한(밀리초)을 설정합니다.
    pub fn store_timeout_ms(mut self, ms: u64) -> Self {
        self.config.store_timeout_ms = ms;
        self
    }

    /// 설정을 검증하고 `PipelineConfig`를 생성합니다.
    pub fn build(self) -> Result<PipelineConfig, LogPipelineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
