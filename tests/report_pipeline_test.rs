/// Pipeline integration tests
///
/// Exercises the report pipeline end to end against a stubbed price provider
/// and stubbed delivery channels:
/// - return computation from the last two aligned closes
/// - all-or-nothing row alignment across tickers
/// - fatal data errors aborting before any filesystem side effect
/// - per-channel failure isolation in the dispatcher
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use marketbrief::config::ReportConfig;
use marketbrief::errors::{DeliveryError, ReportError};
use marketbrief::external::price_provider::{
    ExternalPricePoint, PriceProvider, PriceProviderError,
};
use marketbrief::jobs::daily_report_job;
use marketbrief::models::{ChannelKind, RenderedReport, Sentiment, TickerSpec};
use marketbrief::services::chart_service::{ChartFailurePolicy, ChartRenderer, ChartTheme};
use marketbrief::services::market_data_service::MarketDataFetcher;
use marketbrief::services::notification_service::{NotificationChannel, NotificationDispatcher};
use marketbrief::services::report_service::ReportAssembler;
use marketbrief::services::returns_service;
use marketbrief::services::template::EmailTemplate;
use marketbrief::state::ReportContext;

// ---------------------------------------------------------------------------
// Stubs
// ---------------------------------------------------------------------------

struct StubProvider {
    series: HashMap<String, Vec<ExternalPricePoint>>,
}

impl StubProvider {
    fn new(series: Vec<(&str, Vec<ExternalPricePoint>)>) -> Self {
        Self {
            series: series
                .into_iter()
                .map(|(symbol, points)| (symbol.to_string(), points))
                .collect(),
        }
    }
}

#[async_trait]
impl PriceProvider for StubProvider {
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        _days: u32,
    ) -> Result<Vec<ExternalPricePoint>, PriceProviderError> {
        Ok(self.series.get(ticker).cloned().unwrap_or_default())
    }
}

struct StubChannel {
    kind: ChannelKind,
    fail: bool,
}

#[async_trait]
impl NotificationChannel for StubChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    async fn deliver(&self, _report: &RenderedReport) -> Result<(), DeliveryError> {
        if self.fail {
            Err(DeliveryError::Transport("relay unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 6, d).unwrap()
}

fn series(values: &[f64]) -> Vec<ExternalPricePoint> {
    values
        .iter()
        .enumerate()
        .map(|(i, close)| ExternalPricePoint { date: day(i as u32 + 1), close: *close })
        .collect()
}

fn tickers() -> Vec<TickerSpec> {
    vec![TickerSpec::new("IBOV", "Ibovespa"), TickerSpec::new("SPX", "S&P500")]
}

fn context(provider: StubProvider, channels: Vec<Box<dyn NotificationChannel>>) -> ReportContext {
    ReportContext {
        config: ReportConfig {
            tickers: tickers(),
            lookback_days: 180,
            chart_window_days: 31,
            // Prices in the stub are years old, so the display window is
            // empty and the Skip policy drops every chart: the pipeline runs
            // without touching a drawing backend.
            graphs_dir: std::env::temp_dir().join("marketbrief-pipeline-test-graphs"),
            snapshot_path: None,
            schedule: "0 0 12 * * *".to_string(),
        },
        price_provider: Arc::new(provider),
        news_provider: None,
        news_items: 5,
        charts: ChartRenderer::new(ChartTheme::default(), ChartFailurePolicy::Skip),
        assembler: ReportAssembler::new(Arc::new(EmailTemplate)),
        dispatcher: NotificationDispatcher::new(channels),
    }
}

// ---------------------------------------------------------------------------
// Data acquisition and computation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn returns_match_the_reference_scenario() {
    // IBOV [100, 101, 99] and SPX [200, 202, 198]: both -1.98%, both
    // non-positive.
    let provider = StubProvider::new(vec![
        ("IBOV", series(&[100.0, 101.0, 99.0])),
        ("SPX", series(&[200.0, 202.0, 198.0])),
    ]);

    let dataset = MarketDataFetcher::new(Arc::new(provider))
        .fetch(&tickers(), 180)
        .await
        .unwrap();
    let returns = returns_service::compute_returns(&dataset).unwrap();

    assert_eq!(returns["IBOV"].text(), "-1.98%");
    assert_eq!(returns["SPX"].text(), "-1.98%");
    assert_eq!(returns["IBOV"].sentiment(), Sentiment::NonPositive);
    assert_eq!(returns["SPX"].sentiment(), Sentiment::NonPositive);
}

#[tokio::test]
async fn a_gap_in_one_ticker_drops_the_day_for_all() {
    let mut spx = series(&[200.0, 202.0, 198.0, 199.0]);
    spx.remove(1); // SPX has no value on day 2
    let provider =
        StubProvider::new(vec![("IBOV", series(&[100.0, 101.0, 99.0, 98.0])), ("SPX", spx)]);

    let dataset = MarketDataFetcher::new(Arc::new(provider))
        .fetch(&tickers(), 180)
        .await
        .unwrap();

    assert_eq!(dataset.rows(), 3);
    for symbol in ["IBOV", "SPX"] {
        let dates: Vec<_> = dataset.series(symbol).unwrap().iter().map(|p| p.date).collect();
        assert!(!dates.contains(&day(2)), "{symbol} still carries the dropped day");
    }
}

#[tokio::test]
async fn empty_provider_response_aborts_before_any_side_effect() {
    let graphs_dir = std::env::temp_dir().join("marketbrief-no-side-effects-graphs");
    let _ = std::fs::remove_dir_all(&graphs_dir);

    let mut ctx = context(StubProvider::new(vec![]), vec![]);
    ctx.config.graphs_dir = graphs_dir.clone();

    let err = daily_report_job::run(&ctx).await.unwrap_err();

    assert!(matches!(err, ReportError::DataUnavailable(_)));
    assert!(!graphs_dir.exists(), "graphs dir was created despite the fatal error");
}

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn email_outage_still_delivers_the_chat_digest() {
    let provider = StubProvider::new(vec![
        ("IBOV", series(&[100.0, 101.0, 99.0])),
        ("SPX", series(&[200.0, 202.0, 198.0])),
    ]);
    let ctx = context(
        provider,
        vec![
            Box::new(StubChannel { kind: ChannelKind::Email, fail: true }),
            Box::new(StubChannel { kind: ChannelKind::Telegram, fail: false }),
        ],
    );

    // The run must complete despite the dead email channel.
    let summary = daily_report_job::run(&ctx).await.unwrap();

    assert_eq!(summary.outcomes.len(), 2);
    assert!(!summary.outcomes[&ChannelKind::Email].is_success());
    assert!(summary.outcomes[&ChannelKind::Telegram].is_success());
    assert_eq!(summary.failed_channels(), vec![ChannelKind::Email]);
}
