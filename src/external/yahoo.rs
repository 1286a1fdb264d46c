use crate::external::price_provider::{ExternalPricePoint, PriceProvider, PriceProviderError};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;

pub struct YahooProvider {
    client: reqwest::Client,
}

impl YahooProvider {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

// Minimal response structs (only what we need)
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    timestamp: Option<Vec<i64>>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
    adjclose: Option<Vec<YahooAdjClose>>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct YahooAdjClose {
    adjclose: Vec<Option<f64>>,
}

#[async_trait]
impl PriceProvider for YahooProvider {
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<ExternalPricePoint>, PriceProviderError> {
        // Yahoo works in named ranges, not day counts. Map roughly.
        let range = if days <= 30 {
            "1mo"
        } else if days <= 180 {
            "6mo"
        } else {
            "1y"
        };

        let url = format!(
            "https://query1.finance.yahoo.com/v8/finance/chart/{ticker}?range={range}&interval=1d&includeAdjustedClose=true"
        );

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PriceProviderError::RateLimited);
        }

        let body = resp
            .json::<YahooChartResponse>()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        let result = body
            .chart
            .result
            .and_then(|mut r| r.pop())
            .ok_or_else(|| PriceProviderError::BadResponse("missing result".into()))?;

        let timestamps = result
            .timestamp
            .ok_or_else(|| PriceProviderError::BadResponse("missing timestamps".into()))?;

        // Adjusted close when Yahoo supplies it; FX pairs and indices only
        // carry the raw quote close.
        let closes = match result.indicators.adjclose.and_then(|mut a| a.pop()) {
            Some(adj) => adj.adjclose,
            None => result
                .indicators
                .quote
                .first()
                .ok_or_else(|| PriceProviderError::BadResponse("missing quote".into()))?
                .close
                .clone(),
        };

        let mut out = Vec::new();

        for (i, ts) in timestamps.iter().enumerate() {
            // skip missing closes; alignment downstream handles the gaps
            let Some(close) = closes.get(i).and_then(|v| *v) else { continue };

            let dt = DateTime::from_timestamp(*ts, 0)
                .ok_or_else(|| PriceProviderError::Parse("bad timestamp".into()))?;

            out.push(ExternalPricePoint { date: dt.date_naive(), close });
        }

        out.sort_by_key(|p| p.date);
        out.dedup_by_key(|p| p.date);

        Ok(out)
    }
}
