//! 집계 루프 -- 모든 생산자의 레코드를 받아 싱크에 저장합니다.
//!
//! 단일 태스크가 레코드 채널과 취소 토큰을 동시에 대기합니다.
//!
//! # 종료 조건
//! - 취소 토큰이 취소됨 (진행 중인 저장도 중단되며 실패로 집계)
//! - 모든 생산자가 종료되어 레코드 채널이 닫힘
//!
//! 종료 시 싱크와 [`RunStatistics`]를 [`AggregatorOutput`]으로 돌려줍니다.
//! 싱크 close는 호출측(파이프라인)이 한 번만 수행합니다.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use logconv_core::error::StorageError;
use logconv_core::metrics as m;
use logconv_core::pipeline::DynLogSink;
use logconv_core::types::LogRecord;

use crate::stats::RunStatistics;

/// 집계 루프 종료 결과
pub struct AggregatorOutput {
    /// 레코드를 저장하던 싱크 (아직 닫히지 않음)
    pub sink: Box<dyn DynLogSink>,
    /// 최종 통계
    pub stats: RunStatistics,
}

/// 집계 루프
pub struct Aggregator {
    record_rx: mpsc::Receiver<LogRecord>,
    sink: Box<dyn DynLogSink>,
    cancel: CancellationToken,
    store_timeout: Option<Duration>,
    stats: RunStatistics,
}

impl Aggregator {
    /// 새 집계 루프를 생성합니다.
    ///
    /// `store_timeout`이 `None`이면 저장 한 건의 시간 제한을 두지 않습니다.
    pub fn new(
        record_rx: mpsc::Receiver<LogRecord>,
        sink: Box<dyn DynLogSink>,
        cancel: CancellationToken,
        store_timeout: Option<Duration>,
    ) -> Self {
        Self {
            record_rx,
            sink,
            cancel,
            store_timeout,
            stats: RunStatistics::default(),
        }
    }

    /// 종료 조건까지 레코드를 수신하여 저장합니다.
    pub async fn run(mut self) -> AggregatorOutput {
        tracing::info!(sink = self.sink.name(), "aggregator started");

        loop {
            let record = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::info!("aggregator cancelled");
                    break;
                }
                received = self.record_rx.recv() => match received {
                    Some(record) => record,
                    None => {
                        tracing::info!("all producers finished, aggregator draining complete");
                        break;
                    }
                },
            };

            self.stats.record_received();
            tracing::debug!(file = %record.source_file, "record received");
            tracing::trace!(total = self.stats.total, "running total");
            metrics::counter!(m::PIPELINE_RECORDS_RECEIVED_TOTAL, m::LABEL_FORMAT => record.format.clone())
                .increment(1);

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(None),
                res = store_record(&mut self.sink, &record, self.store_timeout) => res.map_err(Some),
            };

            match result {
                Ok(()) => {
                    self.stats.record_stored();
                    metrics::counter!(m::PIPELINE_RECORDS_STORED_TOTAL).increment(1);
                }
                Err(err) => {
                    self.stats.record_failed();
                    metrics::counter!(m::PIPELINE_STORE_FAILURES_TOTAL).increment(1);
                    match err {
                        Some(e) => tracing::warn!(
                            file = %record.source_file,
                            message = %record.message,
                            error = %e,
                            "failed to store record"
                        ),
                        None => {
                            tracing::info!(
                                file = %record.source_file,
                                "store interrupted by shutdown"
                            );
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!(stats = %self.stats, "aggregator stopped");

        AggregatorOutput {
            sink: self.sink,
            stats: self.stats,
        }
    }
}

/// 레코드 하나를 저장합니다. 시간 제한을 넘기면 [`StorageError::Timeout`]을 반환합니다.
async fn store_record(
    sink: &mut Box<dyn DynLogSink>,
    record: &LogRecord,
    timeout: Option<Duration>,
) -> Result<(), StorageError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, sink.store(record))
            .await
            .map_err(|_| StorageError::Timeout {
                timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            })?,
        None => sink.store(record).await,
    }
}
