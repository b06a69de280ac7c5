#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`collector`]: 파일 테일 생산자 (파일마다 하나의 태스크)
//! - [`parser`]: `<timestamp> | <message>` 라인 파서와 시간 형식 레지스트리
//! - [`aggregator`]: 레코드 수신/저장 루프와 통계 집계
//! - [`sink`]: JSON Lines 파일 싱크, 인메모리 싱크
//! - [`stats`]: 실행 통계와 종료 보고서
//! - [`pipeline`]: 전체 파이프라인 오케스트레이션 (Pipeline trait 구현)
//! - [`config`]: 파이프라인 설정 (core 설정에서 파생)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! FileTailer x N -> mpsc<LogRecord> -> Aggregator -> LogSink
//!       |                                  |
//!  parse_line (format registry)      RunStatistics
//! ```

pub mod aggregator;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod stats;

pub mod collector;
pub mod parser;
pub mod sink;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{LogPipeline, LogPipelineBuilder};

// 설정
pub use config::{PipelineConfig, PipelineConfigBuilder};

// 에러
pub use error::{LineParseError, LogPipelineError, ParseErrorKind};

// 파서
pub use parser::parse_line;

// 수집기
pub use collector::{FileTailer, TailOptions};

// 싱크
pub use sink::{JsonLinesSink, MemorySink, MemorySinkHandle};

// 통계
pub use stats::RunStatistics;
