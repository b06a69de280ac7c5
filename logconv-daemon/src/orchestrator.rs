//! Pipeline orchestration -- assembly, lifecycle management, and shutdown.
//!
//! The [`Orchestrator`] is the central coordinator of `logconv-daemon`.
//! It loads configuration, opens the storage sink, builds the log pipeline,
//! and runs it until either a shutdown signal arrives or every producer
//! has finished.
//!
//! # Shutdown
//!
//! 1. Cancel every producer and the aggregation loop
//! 2. Collect the final statistics from the aggregation loop
//! 3. Close the sink exactly once
//!
//! The caller prints the execution report exactly once after [`Orchestrator::run`].

use std::future::Future;
use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use tokio::signal::unix::{Signal, SignalKind, signal};

use logconv_core::config::LogconvConfig;
use logconv_core::pipeline::{HealthStatus, Pipeline};
use logconv_pipeline::{JsonLinesSink, LogPipeline, LogPipelineBuilder, PipelineConfig, RunStatistics};

/// Why the main loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// An OS signal (or test trigger) requested shutdown.
    Signal(&'static str),
    /// Every producer finished and all records were handled.
    Drained,
    /// Every configured file failed to start tailing, so nothing ran.
    NoProducers,
}

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: LogconvConfig,
    /// The log pipeline (owns the sink while running).
    pipeline: LogPipeline,
    /// Daemon start time (for uptime reporting).
    start_time: Instant,
    /// Why the last run ended.
    stop_reason: Option<StopReason>,
}

impl Orchestrator {
    /// Load configuration and build the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read or parsed
    /// - Configuration validation fails
    /// - The storage collection cannot be opened
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = LogconvConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config).await
    }

    /// Build from an already-loaded configuration.
    ///
    /// Opens the JSON lines collection (dropping it first when
    /// `storage.drop_collection` is set) and wires it into the pipeline.
    pub async fn build_from_config(config: LogconvConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        tracing::info!(
            output_dir = %config.storage.output_dir,
            collection = %config.storage.collection,
            drop_collection = config.storage.drop_collection,
            "opening storage"
        );
        let sink = JsonLinesSink::open(&config.storage)
            .await
            .map_err(|e| anyhow::anyhow!("failed to open storage: {}", e))?;

        let pipeline_config = PipelineConfig::from_core(&config);
        let pipeline = LogPipelineBuilder::new()
            .config(pipeline_config)
            .sink(sink)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build log pipeline: {}", e))?;

        tracing::info!(files = config.files.len(), "orchestrator initialized");

        Ok(Self {
            config,
            pipeline,
            start_time: Instant::now(),
            stop_reason: None,
        })
    }

    /// Start the pipeline and block until `SIGTERM`/`SIGINT` or until
    /// every producer has finished, then shut down.
    ///
    /// Signal handlers are installed before any producer starts and stay
    /// installed through shutdown, so a second signal does not interrupt it.
    pub async fn run(&mut self) -> Result<RunStatistics> {
        let mut signals = ShutdownSignals::install()?;
        self.run_until(async { Ok(signals.recv().await) }).await
    }

    /// Start the pipeline and block until `shutdown` resolves or until
    /// every producer has finished, then shut down.
    ///
    /// Returns the final statistics. The pipeline is always stopped
    /// before returning, even when `shutdown` resolves to an error.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<RunStatistics>
    where
        F: Future<Output = Result<&'static str>>,
    {
        self.pipeline
            .start()
            .await
            .map_err(|e| anyhow::anyhow!("failed to start log pipeline: {}", e))?;

        tracing::info!("logconv-daemon running");

        let outcome = tokio::select! {
            signal = shutdown => signal.map(StopReason::Signal),
            finished = self.pipeline.wait_finished() => {
                if let Err(e) = finished {
                    tracing::error!(error = %e, "aggregation loop ended abnormally");
                }
                Ok(StopReason::Drained)
            }
        };

        match &outcome {
            Ok(StopReason::Signal(signal)) => {
                tracing::info!(signal = *signal, "shutdown signal received");
            }
            Ok(StopReason::Drained | StopReason::NoProducers) => {
                tracing::info!("all producers finished")
            }
            Err(e) => tracing::error!(error = %e, "failed to wait for shutdown signal"),
        }

        self.shutdown().await;
        let mut reason = outcome?;

        // stop() waits for the error reporter, so the failure count is final here
        let files = self.config.files.len() as u64;
        if reason == StopReason::Drained && self.pipeline.tail_failure_count() >= files {
            tracing::warn!(
                files,
                tail_failures = self.pipeline.tail_failure_count(),
                "no producer running: every configured file failed to start tailing"
            );
            reason = StopReason::NoProducers;
        }
        self.stop_reason = Some(reason);

        let stats = self.pipeline.statistics().unwrap_or_default();
        tracing::info!(
            %stats,
            uptime_secs = self.start_time.elapsed().as_secs(),
            "logconv-daemon shut down"
        );
        Ok(stats)
    }

    /// Stop the pipeline. Failures are logged, not returned, so the
    /// report can still be printed.
    async fn shutdown(&mut self) {
        tracing::info!("stopping log pipeline");
        if let Err(e) = self.pipeline.stop().await {
            tracing::error!(error = %e, "failed to stop log pipeline");
        }
    }

    /// Current pipeline health.
    pub async fn health(&self) -> HealthStatus {
        self.pipeline.health_check().await
    }

    /// Why the last [`run_until`](Self::run_until) ended, once it has returned.
    pub fn stop_reason(&self) -> Option<&StopReason> {
        self.stop_reason.as_ref()
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &LogconvConfig {
        &self.config
    }
}

/// Installed SIGTERM/SIGINT handlers.
pub struct ShutdownSignals {
    sigterm: Signal,
    sigint: Signal,
}

impl ShutdownSignals {
    /// Install the signal handlers.
    ///
    /// # Errors
    ///
    /// Returns an error if signal handlers cannot be installed.
    pub fn install() -> Result<Self> {
        let sigterm = signal(SignalKind::terminate())
            .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
        let sigint = signal(SignalKind::interrupt())
            .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;
        Ok(Self { sigterm, sigint })
    }

    /// Wait for the next signal and return its name.
    pub async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
        }
    }
}
