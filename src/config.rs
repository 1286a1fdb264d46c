use std::io::Read;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::errors::ReportError;
use crate::models::TickerSpec;

/// Everything the report pipeline needs that is not a secret. Secrets
/// (SMTP password, bot token) are read by the channels themselves, straight
/// from the environment at send time.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub tickers: Vec<TickerSpec>,
    /// History requested from the provider, in days. Long enough for both
    /// the period return and the chart window.
    pub lookback_days: u32,
    /// Trailing span actually drawn on the charts, in days.
    pub chart_window_days: i64,
    pub graphs_dir: PathBuf,
    pub snapshot_path: Option<PathBuf>,
    /// Cron expression (sec min hour day month weekday) for the daily run.
    pub schedule: String,
}

impl ReportConfig {
    pub fn from_env() -> Result<Self, ReportError> {
        let tickers_file = std::env::var("TICKERS_FILE")
            .unwrap_or_else(|_| "tickers.csv".to_string());

        let tickers = match std::fs::File::open(&tickers_file) {
            Ok(file) => {
                let tickers = load_tickers(file)
                    .map_err(|e| ReportError::Config(format!("{tickers_file}: {e}")))?;
                info!("Loaded {} tickers from {}", tickers.len(), tickers_file);
                tickers
            }
            Err(_) => {
                warn!("{} not found, using the built-in ticker set", tickers_file);
                default_tickers()
            }
        };

        if tickers.is_empty() {
            return Err(ReportError::Config(format!(
                "ticker list from {tickers_file} is empty"
            )));
        }

        Ok(Self {
            tickers,
            lookback_days: env_parse("REPORT_LOOKBACK_DAYS", 180),
            chart_window_days: env_parse("CHART_WINDOW_DAYS", 31),
            graphs_dir: PathBuf::from(
                std::env::var("GRAPHS_DIR").unwrap_or_else(|_| "graphs".to_string()),
            ),
            snapshot_path: std::env::var("SNAPSHOT_PATH").ok().map(PathBuf::from),
            schedule: std::env::var("REPORT_SCHEDULE")
                .unwrap_or_else(|_| "0 0 12 * * *".to_string()),
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Parse `symbol,name` rows (no header). A missing or empty name column
/// falls back to the symbol at display time. Duplicate symbols keep the
/// first occurrence so the join key stays unique within a run.
fn load_tickers<R: Read>(reader: R) -> Result<Vec<TickerSpec>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut out: Vec<TickerSpec> = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let Some(symbol) = record.get(0).filter(|s| !s.is_empty()) else { continue };
        if out.iter().any(|t| t.symbol == symbol) {
            warn!("Duplicate ticker {} in config, keeping the first entry", symbol);
            continue;
        }
        let name = record.get(1).unwrap_or("");
        out.push(TickerSpec::new(symbol, name));
    }
    Ok(out)
}

/// The shipped default set, used when no ticker file is configured.
fn default_tickers() -> Vec<TickerSpec> {
    vec![
        TickerSpec::new("^BVSP", "Ibovespa"),
        TickerSpec::new("^GSPC", "S&P500"),
        TickerSpec::new("BRL=X", "Dolar"),
    ]
}
