//! 레코드 싱크 구현
//!
//! - [`JsonLinesSink`]: `{output_dir}/{collection}.jsonl` 파일에 JSON 한 줄씩 추가
//! - [`MemorySink`]: 메모리 보관 (지연/실패 주입 지원)
//!
//! 두 싱크 모두 core의 [`LogSink`](logconv_core::pipeline::LogSink)를 구현하며,
//! 파이프라인은 `Box<dyn DynLogSink>`로 보관합니다.

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonLinesSink;
pub use memory::{MemorySink, MemorySinkHandle};
