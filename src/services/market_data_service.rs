use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::ReportError;
use crate::external::price_provider::{ExternalPricePoint, PriceProvider, PriceProviderError};
use crate::models::{MarketDataset, TickerSpec};

/// Turns the configured ticker set into one validated, aligned dataset.
pub struct MarketDataFetcher {
    provider: Arc<dyn PriceProvider>,
}

impl MarketDataFetcher {
    pub fn new(provider: Arc<dyn PriceProvider>) -> Self {
        Self { provider }
    }

    /// Fetch daily history for every ticker and align the series onto a
    /// common, gap-free date axis. The provider is per-symbol, so tickers
    /// are fetched one by one; order between fetches does not matter.
    pub async fn fetch(
        &self,
        tickers: &[TickerSpec],
        lookback_days: u32,
    ) -> Result<MarketDataset, ReportError> {
        let mut raw: Vec<(String, Vec<ExternalPricePoint>)> = Vec::with_capacity(tickers.len());

        for spec in tickers {
            let points = self
                .provider
                .fetch_daily_history(&spec.symbol, lookback_days)
                .await
                .map_err(|e| match e {
                    PriceProviderError::RateLimited => {
                        ReportError::External(format!("rate limited fetching {}", spec.symbol))
                    }
                    other => ReportError::External(format!("{}: {}", spec.symbol, other)),
                })?;

            if points.is_empty() {
                return Err(ReportError::DataUnavailable(format!(
                    "provider returned no rows for {}",
                    spec.symbol
                )));
            }

            debug!("Fetched {} rows for {}", points.len(), spec.symbol);
            raw.push((spec.symbol.clone(), points));
        }

        let dataset = align(raw)?;
        info!(
            "Market dataset ready: {} tickers x {} aligned rows",
            dataset.symbols().len(),
            dataset.rows()
        );
        Ok(dataset)
    }
}

/// All-or-nothing row filter: a date survives only if every ticker has a
/// value on it, so every downstream series shares an identical axis.
pub(crate) fn align(
    raw: Vec<(String, Vec<ExternalPricePoint>)>,
) -> Result<MarketDataset, ReportError> {
    if raw.is_empty() {
        return Err(ReportError::DataUnavailable("no tickers requested".into()));
    }

    let by_symbol: Vec<(String, BTreeMap<chrono::NaiveDate, f64>)> = raw
        .into_iter()
        .map(|(symbol, points)| {
            let map = points.into_iter().map(|p| (p.date, p.close)).collect();
            (symbol, map)
        })
        .collect();

    let dates: Vec<chrono::NaiveDate> = by_symbol[0]
        .1
        .keys()
        .filter(|d| by_symbol[1..].iter().all(|(_, m)| m.contains_key(*d)))
        .copied()
        .collect();

    if dates.len() < 2 {
        return Err(ReportError::DataUnavailable(format!(
            "only {} aligned rows across all tickers, need at least 2",
            dates.len()
        )));
    }

    let symbols: Vec<String> = by_symbol.iter().map(|(s, _)| s.clone()).collect();
    let mut closes = HashMap::with_capacity(symbols.len());
    for (symbol, map) in &by_symbol {
        let column: Vec<f64> = dates.iter().map(|d| map[d]).collect();
        closes.insert(symbol.clone(), column);
    }

    Ok(MarketDataset::new(symbols, dates, closes))
}
