//! 인메모리 싱크
//!
//! 저장한 레코드를 메모리에 보관합니다. 저장 지연과 실패 주입을 지원하여
//! 파이프라인의 취소 응답성과 실패 카운팅을 검증하는 데 사용합니다.
//!
//! 싱크는 파이프라인이 소유하므로, 저장 결과는 [`MemorySinkHandle`]로 확인합니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;

use logconv_core::error::StorageError;
use logconv_core::pipeline::LogSink;
use logconv_core::types::LogRecord;

/// 실패 주입 조건
type FailurePredicate = Box<dyn Fn(&LogRecord) -> bool + Send + Sync>;

/// 싱크와 핸들이 공유하는 상태
#[derive(Default)]
struct Shared {
    records: Mutex<Vec<LogRecord>>,
    attempts: AtomicU64,
    closes: AtomicU64,
}

/// 인메모리 싱크
pub struct MemorySink {
    shared: Arc<Shared>,
    delay: Option<Duration>,
    fail_when: Option<FailurePredicate>,
    closed: bool,
}

impl MemorySink {
    /// 새 싱크와 조회용 핸들을 생성합니다.
    pub fn new() -> (Self, MemorySinkHandle) {
        let shared = Arc::new(Shared::default());
        let handle = MemorySinkHandle {
            shared: Arc::clone(&shared),
        };
        let sink = Self {
            shared,
            delay: None,
            fail_when: None,
            closed: false,
        };
        (sink, handle)
    }

    /// 저장할 때마다 지정한 시간만큼 지연합니다.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 조건을 만족하는 레코드의 저장을 실패시킵니다.
    pub fn fail_when(
        mut self,
        predicate: impl Fn(&LogRecord) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.fail_when = Some(Box::new(predicate));
        self
    }
}

impl LogSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn store(&mut self, record: &LogRecord) -> Result<(), StorageError> {
        if self.closed {
            return Err(StorageError::Closed);
        }
        self.shared.attempts.fetch_add(1, Ordering::Relaxed);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_when.as_ref().is_some_and(|fail| fail(record)) {
            return Err(StorageError::Write(format!(
                "injected failure for '{}'",
                record.message
            )));
        }

        self.shared.records.lock().await.push(record.clone());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), StorageError> {
        self.closed = true;
        self.shared.closes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// [`MemorySink`]의 저장 결과 조회 핸들
#[derive(Clone)]
pub struct MemorySinkHandle {
    shared: Arc<Shared>,
}

impl MemorySinkHandle {
    /// 저장된 레코드 복사본을 반환합니다.
    pub async fn records(&self) -> Vec<LogRecord> {
        self.shared.records.lock().await.clone()
    }

    /// 저장된 레코드 수를 반환합니다.
    pub async fn len(&self) -> usize {
        self.shared.records.lock().await.len()
    }

    /// 저장된 레코드가 없는지 확인합니다.
    pub async fn is_empty(&self) -> bool {
        self.shared.records.lock().await.is_empty()
    }

    /// 저장 시도 횟수 (실패 포함)
    pub fn attempts(&self) -> u64 {
        self.shared.attempts.load(Ordering::Relaxed)
    }

    /// close 호출 횟수
    pub fn close_count(&self) -> u64 {
        self.shared.closes.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(message: &str) -> LogRecord {
        LogRecord {
            timestamp: Utc::now(),
            message: message.to_owned(),
            source_file: "mem.log".to_owned(),
            format: "first".to_owned(),
        }
    }

    #[tokio::test]
    async fn stores_records_in_order() {
        let (mut sink, handle) = MemorySink::new();
        sink.store(&record("a")).await.unwrap();
        sink.store(&record("b")).await.unwrap();

        let messages: Vec<String> = handle.records().await.into_iter().map(|r| r.message).collect();
        assert_eq!(messages, vec!["a", "b"]);
        assert_eq!(handle.attempts(), 2);
    }

    #[tokio::test]
    async fn injected_failure_is_not_stored() {
        let (sink, handle) = MemorySink::new();
        let mut sink = sink.fail_when(|r| r.message.contains("boom"));

        sink.store(&record("ok")).await.unwrap();
        let err = sink.store(&record("boom")).await.unwrap_err();
        assert!(matches!(err, StorageError::Write(_)));

        assert_eq!(handle.len().await, 1);
        assert_eq!(handle.attempts(), 2);
    }

    #[tokio::test]
    async fn close_is_counted_and_blocks_store() {
        let (mut sink, handle) = MemorySink::new();
        assert!(handle.is_empty().await);
        sink.close().await.unwrap();
        assert_eq!(handle.close_count(), 1);
        assert!(matches!(
            sink.store(&record("late")).await,
            Err(StorageError::Closed)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn delay_is_applied() {
        let (sink, handle) = MemorySink::new();
        let mut sink = sink.with_delay(Duration::from_secs(2));

        let started = tokio::time::Instant::now();
        sink.store(&record("slow")).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert_eq!(handle.len().await, 1);
    }
}
