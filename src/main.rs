use std::sync::Arc;

use marketbrief::config::ReportConfig;
use marketbrief::external::yahoo::YahooProvider;
use marketbrief::jobs::daily_report_job;
use marketbrief::logging::{init_logging, LoggingConfig};
use marketbrief::services::chart_service::{ChartFailurePolicy, ChartRenderer, ChartTheme};
use marketbrief::services::news_service::NewsConfig;
use marketbrief::services::notification_service::NotificationDispatcher;
use marketbrief::services::report_service::ReportAssembler;
use marketbrief::services::scheduler_service;
use marketbrief::services::template::EmailTemplate;
use marketbrief::state::ReportContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env()).map_err(|e| anyhow::anyhow!("logging: {e}"))?;

    let config = ReportConfig::from_env()?;
    let news_config = NewsConfig::from_env();

    let dispatcher = NotificationDispatcher::from_env();
    if dispatcher.channel_count() == 0 {
        tracing::warn!("No notification channels enabled; reports will be built but not delivered");
    }

    // The chart theme is built exactly once, before any chart is drawn, and
    // travels inside the renderer rather than as process-global state.
    let ctx = Arc::new(ReportContext {
        price_provider: Arc::new(YahooProvider::new()),
        news_provider: news_config.provider(),
        news_items: news_config.max_items,
        charts: ChartRenderer::new(ChartTheme::default(), ChartFailurePolicy::from_env()),
        assembler: ReportAssembler::new(Arc::new(EmailTemplate)),
        dispatcher,
        config,
    });

    if std::env::args().any(|arg| arg == "--once") {
        daily_report_job::run(&ctx).await?;
        return Ok(());
    }

    let _scheduler = scheduler_service::start(ctx.clone()).await?;
    tracing::info!("marketbrief running, next report at '{}'", ctx.config.schedule);
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    Ok(())
}
