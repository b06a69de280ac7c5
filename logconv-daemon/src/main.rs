use anyhow::Result;
use clap::Parser;

use logconv_core::config::LogconvConfig;
use logconv_daemon::cli::DaemonCli;
use logconv_daemon::logging::init_tracing;
use logconv_daemon::orchestrator::{Orchestrator, StopReason};
use logconv_pipeline::PipelineConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    // 설정 로드 (파일 -> 환경변수 -> CLI 오버라이드)
    let mut config = LogconvConfig::load(&cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load config {}: {}", cli.config.display(), e))?;
    cli.apply_overrides(&mut config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;
    PipelineConfig::from_core(&config)
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

    if cli.validate {
        println!("configuration is valid: {}", cli.config.display());
        return Ok(());
    }

    // 로깅 초기화
    init_tracing(&config.general)?;
    tracing::info!(config = %cli.config.display(), "logconv-daemon starting");
    logconv_core::metrics::describe_all();

    let mut orchestrator = Orchestrator::build_from_config(config).await?;
    let stats = orchestrator.run().await?;

    // 실행 통계 보고서 (정확히 한 번)
    print!("{}", stats.render_report());

    if orchestrator.stop_reason() == Some(&StopReason::NoProducers) {
        anyhow::bail!("no configured file could be tailed");
    }
    Ok(())
}
