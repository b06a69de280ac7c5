//! 파이프라인 오케스트레이션 -- 생산자/집계 루프/에러 리포터의 생명주기를 관리합니다.
//!
//! [`LogPipeline`]은 core의 [`Pipeline`](logconv_core::pipeline::Pipeline) trait을 구현하여
//! `logconv-daemon`에서 start/stop/health_check 생명주기로 관리됩니다.
//!
//! # 내부 아키텍처
//! ```text
//! FileTailer (파일마다) --records--> mpsc --> Aggregator --> LogSink
//!        |
//!        +-------------errors-----> mpsc --> error reporter (tracing)
//! ```
//!
//! 모든 태스크는 하나의 [`CancellationToken`]을 공유합니다 (생산자는 자식 토큰).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use logconv_core::error::{LogconvError, PipelineError};
use logconv_core::pipeline::{DynLogSink, HealthStatus, Pipeline};
use logconv_core::types::LogRecord;

use crate::aggregator::{Aggregator, AggregatorOutput};
use crate::collector::{FileTailer, TailSummary};
use crate::config::PipelineConfig;
use crate::error::LogPipelineError;
use crate::stats::RunStatistics;

/// 파이프라인 실행 상태
#[derive(Debug, Clone, PartialEq, Eq)]
enum PipelineState {
    /// 초기화됨, 아직 시작하지 않음
    Initialized,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
}

/// 에러 리포터가 갱신하는 카운터
#[derive(Debug, Default)]
struct ErrorCounters {
    parse_errors: AtomicU64,
    tail_failures: AtomicU64,
}

/// 로그 파이프라인 -- 설정된 파일을 테일링하여 싱크에 저장합니다.
///
/// # 사용 예시
/// ```no_run
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// use logconv_core::pipeline::Pipeline;
/// use logconv_pipeline::{LogPipelineBuilder, PipelineConfigBuilder};
/// use logconv_pipeline::sink::MemorySink;
///
/// let config = PipelineConfigBuilder::new()
///     .file("/var/log/app.log", "first")
///     .follow(false)
///     .build()?;
/// let (sink, _handle) = MemorySink::new();
///
/// let mut pipeline = LogPipelineBuilder::new().config(config).sink(sink).build()?;
/// pipeline.start().await?;
/// pipeline.wait_finished().await?;
/// pipeline.stop().await?;
/// println!("{}", pipeline.statistics().unwrap_or_default().render_report());
/// # Ok(())
/// # }
/// ```
pub struct LogPipeline {
    /// 파이프라인 설정
    config: PipelineConfig,
    /// 현재 상태
    state: PipelineState,
    /// 싱크 (실행 중에는 집계 루프가 소유)
    sink: Option<Box<dyn DynLogSink>>,
    /// 종료 신호
    cancel: CancellationToken,
    /// 생산자 태스크
    producers: Vec<JoinHandle<TailSummary>>,
    /// 집계 루프 태스크
    aggregator: Option<JoinHandle<AggregatorOutput>>,
    /// 에러 리포터 태스크
    error_reporter: Option<JoinHandle<()>>,
    /// 파싱 에러/시작 실패 카운터
    counters: Arc<ErrorCounters>,
    /// 집계 루프 종료 후 확정된 통계
    statistics: Option<RunStatistics>,
}

impl LogPipeline {
    /// 현재 상태를 반환합니다.
    pub fn state_name(&self) -> &str {
        match self.state {
            PipelineState::Initialized => "initialized",
            PipelineState::Running => "running",
            PipelineState::Stopped => "stopped",
        }
    }

    /// 파이프라인 설정을 반환합니다.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 지금까지 보고된 라인 파싱 에러 수를 반환합니다.
    pub fn parse_error_count(&self) -> u64 {
        self.counters.parse_errors.load(Ordering::Relaxed)
    }

    /// 시작에 실패한 생산자 수를 반환합니다.
    pub fn tail_failure_count(&self) -> u64 {
        self.counters.tail_failures.load(Ordering::Relaxed)
    }

    /// 집계 루프 종료 후의 최종 통계를 반환합니다.
    ///
    /// 집계 루프가 아직 실행 중이면 `None`입니다.
    pub fn statistics(&self) -> Option<RunStatistics> {
        self.statistics
    }

    /// 모든 생산자가 끝나 집계 루프가 종료되었는지 확인합니다.
    pub fn is_finished(&self) -> bool {
        self.statistics.is_some()
            || self
                .aggregator
                .as_ref()
                .is_some_and(|handle| handle.is_finished())
    }

    /// 모든 생산자가 끝나고 집계 루프가 남은 레코드를 모두 저장할 때까지 대기합니다.
    ///
    /// follow 모드에서는 파일이 삭제되지 않는 한 반환하지 않으므로
    /// 보통 종료 신호와 함께 `select!`로 대기합니다. 취소해도 안전합니다.
    pub async fn wait_finished(&mut self) -> Result<(), LogPipelineError> {
        let Some(handle) = self.aggregator.as_mut() else {
            return Ok(());
        };
        let joined = handle.await;
        self.aggregator = None;
        self.absorb(joined)
    }

    /// 집계 루프 결과를 반영합니다.
    fn absorb(
        &mut self,
        joined: Result<AggregatorOutput, tokio::task::JoinError>,
    ) -> Result<(), LogPipelineError> {
        match joined {
            Ok(output) => {
                self.sink = Some(output.sink);
                self.statistics = Some(output.stats);
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "aggregator task failed");
                Err(LogPipelineError::Channel(format!("aggregator task failed: {e}")))
            }
        }
    }

    fn spawn_producers(
        &mut self,
        record_tx: &mpsc::Sender<LogRecord>,
        error_tx: &mpsc::Sender<LogPipelineError>,
    ) {
        let options = self.config.tail_options();
        for (path, format) in &self.config.files {
            let tailer = FileTailer::new(
                path,
                format,
                options.clone(),
                record_tx.clone(),
                error_tx.clone(),
                self.cancel.child_token(),
            );
            self.producers.push(tokio::spawn(tailer.run()));
        }
    }
}

/// 에러 채널을 비우며 에러를 로깅하고 카운터를 갱신합니다.
///
/// 모든 생산자가 종료되어 송신측이 닫히면 반환합니다.
async fn report_errors(mut error_rx: mpsc::Receiver<LogPipelineError>, counters: Arc<ErrorCounters>) {
    while let Some(err) = error_rx.recv().await {
        match &err {
            LogPipelineError::Line(_) => {
                counters.parse_errors.fetch_add(1, Ordering::Relaxed);
            }
            LogPipelineError::TailStart { .. } => {
                counters.tail_failures.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
        tracing::error!(error = %err, "pipeline error");
    }
    tracing::debug!("error reporter stopped");
}

impl Pipeline for LogPipeline {
    async fn start(&mut self) -> Result<(), LogconvError> {
        match self.state {
            PipelineState::Running => return Err(PipelineError::AlreadyRunning.into()),
            PipelineState::Stopped => {
                return Err(PipelineError::InitFailed(
                    "a stopped pipeline cannot be restarted".to_owned(),
                )
                .into());
            }
            PipelineState::Initialized => {}
        }

        let sink = self
            .sink
            .take()
            .ok_or_else(|| PipelineError::InitFailed("sink is not available".to_owned()))?;

        tracing::info!(
            files = self.config.files.len(),
            follow = self.config.follow,
            sink = sink.name(),
            "starting log pipeline"
        );

        let (record_tx, record_rx) = mpsc::channel(self.config.channel_capacity);
        let (error_tx, error_rx) = mpsc::channel(self.config.channel_capacity);

        // 1. 집계 루프
        let aggregator = Aggregator::new(
            record_rx,
            sink,
            self.cancel.clone(),
            self.config.store_timeout(),
        );
        self.aggregator = Some(tokio::spawn(aggregator.run()));

        // 2. 에러 리포터
        self.error_reporter = Some(tokio::spawn(report_errors(
            error_rx,
            Arc::clone(&self.counters),
        )));

        // 3. 파일마다 생산자
        self.spawn_producers(&record_tx, &error_tx);

        // 송신측은 생산자만 보유해야 모두 끝났을 때 채널이 닫힌다
        drop(record_tx);
        drop(error_tx);

        self.state = PipelineState::Running;
        tracing::info!(producers = self.producers.len(), "log pipeline started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), LogconvError> {
        if self.state != PipelineState::Running {
            return Err(PipelineError::NotRunning.into());
        }

        tracing::info!("stopping log pipeline");
        self.cancel.cancel();

        // 1. 집계 루프 종료 대기 (싱크와 통계 회수)
        let mut result = Ok(());
        if let Some(handle) = self.aggregator.take() {
            result = self.absorb(handle.await);
        }

        // 2. 생산자 종료 대기
        let mut totals = TailSummary::default();
        for handle in self.producers.drain(..) {
            match handle.await {
                Ok(summary) => {
                    totals.lines += summary.lines;
                    totals.records += summary.records;
                    totals.parse_errors += summary.parse_errors;
                }
                Err(e) => tracing::warn!(error = %e, "producer task failed"),
            }
        }

        // 3. 에러 리포터는 송신측이 모두 닫히면 스스로 끝난다
        if let Some(handle) = self.error_reporter.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "error reporter task failed");
            }
        }

        // 4. 싱크는 정확히 한 번 닫는다
        if let Some(mut sink) = self.sink.take() {
            if let Err(e) = sink.close().await {
                tracing::error!(sink = sink.name(), error = %e, "failed to close sink");
                if result.is_ok() {
                    result = Err(LogPipelineError::Sink(e));
                }
            }
        }

        self.state = PipelineState::Stopped;
        tracing::info!(
            lines = totals.lines,
            parse_errors = self.parse_error_count(),
            stats = %self.statistics.unwrap_or_default(),
            "log pipeline stopped"
        );
        result.map_err(LogconvError::from)
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            PipelineState::Running => {
                let failures = self.tail_failure_count();
                if failures > 0 {
                    HealthStatus::Degraded(format!("{failures} file(s) failed to start tailing"))
                } else if self.is_finished() {
                    HealthStatus::Degraded("all producers finished".to_owned())
                } else {
                    HealthStatus::Healthy
                }
            }
            PipelineState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            PipelineState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

impl Drop for LogPipeline {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// 로그 파이프라인 빌더
pub struct LogPipelineBuilder {
    config: PipelineConfig,
    sink: Option<Box<dyn DynLogSink>>,
}

impl LogPipelineBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            sink: None,
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// 레코드를 저장할 싱크를 지정합니다.
    pub fn sink(mut self, sink: impl DynLogSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// 파이프라인을 빌드합니다.
    ///
    /// 설정이 유효하지 않거나 싱크가 지정되지 않으면 실패합니다.
    pub fn build(self) -> Result<LogPipeline, LogPipelineError> {
        self.config.validate()?;

        let sink = self.sink.ok_or_else(|| LogPipelineError::Config {
            field: "sink".to_owned(),
            reason: "a sink must be provided".to_owned(),
        })?;

        Ok(LogPipeline {
            config: self.config,
            state: PipelineState::Initialized,
            sink: Some(sink),
            cancel: CancellationToken::new(),
            producers: Vec::new(),
            aggregator: None,
            error_reporter: None,
            counters: Arc::new(ErrorCounters::default()),
            statistics: None,
        })
    }
}

impl Default for LogPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
