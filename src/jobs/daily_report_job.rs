use std::collections::HashMap;

use chrono::Utc;
use tracing::{info, warn};

use crate::errors::ReportError;
use crate::models::{ChannelKind, DeliveryResult, RenderedReport};
use crate::services::market_data_service::MarketDataFetcher;
use crate::services::returns_service;
use crate::state::ReportContext;

/// Per-channel outcomes of one run. Data and rendering errors never get this
/// far; they abort the run before any delivery attempt.
#[derive(Debug)]
pub struct RunSummary {
    pub outcomes: HashMap<ChannelKind, DeliveryResult>,
}

impl RunSummary {
    pub fn failed_channels(&self) -> Vec<ChannelKind> {
        self.outcomes
            .values()
            .filter(|r| !r.is_success())
            .map(|r| r.channel)
            .collect()
    }
}

/// One end-to-end report run: fetch, compute, chart, assemble, deliver.
pub async fn run(ctx: &ReportContext) -> Result<RunSummary, ReportError> {
    let started = std::time::Instant::now();
    info!("📈 Building market report for {} ticker(s)", ctx.config.tickers.len());

    let fetcher = MarketDataFetcher::new(ctx.price_provider.clone());
    let dataset = fetcher
        .fetch(&ctx.config.tickers, ctx.config.lookback_days)
        .await?;
    let returns = returns_service::compute_returns(&dataset)?;

    let today = Utc::now().date_naive();
    let charts = ctx.charts.render_charts(
        &dataset,
        ctx.config.chart_window_days,
        &ctx.config.graphs_dir,
        today,
    )?;

    // News is garnish: a failed fetch downgrades to an empty section.
    let news = match &ctx.news_provider {
        Some(provider) => match provider.fetch_news("stock market", ctx.news_items).await {
            Ok(items) => items,
            Err(e) => {
                warn!("News fetch failed, shipping without a news section: {e}");
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    let report = ctx
        .assembler
        .assemble(&ctx.config.tickers, &returns, &charts, news, today);

    if let Some(path) = &ctx.config.snapshot_path {
        let snapshot = ctx.assembler.snapshot(&report, &ctx.config.graphs_dir);
        match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => {
                if let Err(e) = tokio::fs::write(path, json).await {
                    warn!("Could not write snapshot {}: {e}", path.display());
                }
            }
            Err(e) => warn!("Could not serialize snapshot: {e}"),
        }
    }

    let rendered = RenderedReport {
        subject: report.subject(),
        html_body: ctx.assembler.render_html(&report)?,
        digest_text: ctx.assembler.render_digest(&report, &dataset),
        charts,
    };

    let outcomes = ctx.dispatcher.dispatch(&rendered).await;

    let summary = RunSummary { outcomes };
    let failed = summary.failed_channels();
    if failed.is_empty() {
        info!(
            "Report delivered over {} channel(s) in {:.1?}",
            summary.outcomes.len(),
            started.elapsed()
        );
    } else {
        warn!(
            "Report run finished in {:.1?}; failed channel(s): {}",
            started.elapsed(),
            failed.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(", ")
        );
    }

    Ok(summary)
}
