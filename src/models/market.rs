use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One configured instrument: the symbol sent to the data provider plus a
/// human-readable display name (`^GSPC` -> "S&P500").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerSpec {
    pub symbol: String,
    pub name: String,
}

impl TickerSpec {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
        }
    }

    /// Display name, falling back to the raw symbol when none is configured.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.symbol
        } else {
            &self.name
        }
    }
}

/// A single daily observation for one ticker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Price history for one run: a strictly increasing common date axis plus one
/// close column per ticker, all columns the same length as the axis. Built
/// once by the fetcher, read-only afterwards.
#[derive(Debug, Clone)]
pub struct MarketDataset {
    symbols: Vec<String>,
    dates: Vec<NaiveDate>,
    closes: HashMap<String, Vec<f64>>,
}

impl MarketDataset {
    /// Invariants are the caller's responsibility: `dates` strictly
    /// increasing, every column in `closes` the same length as `dates`,
    /// one column per entry in `symbols`.
    pub(crate) fn new(
        symbols: Vec<String>,
        dates: Vec<NaiveDate>,
        closes: HashMap<String, Vec<f64>>,
    ) -> Self {
        debug_assert!(dates.windows(2).all(|w| w[0] < w[1]));
        debug_assert!(symbols.iter().all(|s| {
            closes.get(s).map(|c| c.len() == dates.len()).unwrap_or(false)
        }));
        Self { symbols, dates, closes }
    }

    /// Number of aligned rows shared by every ticker.
    pub fn rows(&self) -> usize {
        self.dates.len()
    }

    /// Ticker symbols in their configured order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Full aligned series for one ticker.
    pub fn series(&self, symbol: &str) -> Option<Vec<PricePoint>> {
        let closes = self.closes.get(symbol)?;
        Some(
            self.dates
                .iter()
                .zip(closes)
                .map(|(date, close)| PricePoint { date: *date, close: *close })
                .collect(),
        )
    }

    /// The two most recent observations, oldest first.
    pub fn last_two(&self, symbol: &str) -> Option<(PricePoint, PricePoint)> {
        let closes = self.closes.get(symbol)?;
        let n = self.dates.len();
        if n < 2 {
            return None;
        }
        Some((
            PricePoint { date: self.dates[n - 2], close: closes[n - 2] },
            PricePoint { date: self.dates[n - 1], close: closes[n - 1] },
        ))
    }

    /// Trailing slice of one ticker's series: observations on or after
    /// `cutoff`. Used for charting, where the display window is shorter than
    /// the fetch lookback.
    pub fn series_from(&self, symbol: &str, cutoff: NaiveDate) -> Option<Vec<PricePoint>> {
        Some(
            self.series(symbol)?
                .into_iter()
                .filter(|p| p.date >= cutoff)
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
    }

    fn dataset() -> MarketDataset {
        let mut closes = HashMap::new();
        closes.insert("SPX".to_string(), vec![200.0, 202.0, 198.0]);
        MarketDataset::new(
            vec!["SPX".to_string()],
            vec![day(1), day(2), day(3)],
            closes,
        )
    }

    #[test]
    fn last_two_returns_oldest_first() {
        let ds = dataset();
        let (prev, last) = ds.last_two("SPX").unwrap();
        assert_eq!(prev.close, 202.0);
        assert_eq!(last.close, 198.0);
        assert!(prev.date < last.date);
    }

    #[test]
    fn series_from_cuts_trailing_window() {
        let ds = dataset();
        let tail = ds.series_from("SPX", day(2)).unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].close, 202.0);
    }

    #[test]
    fn display_name_falls_back_to_symbol() {
        assert_eq!(TickerSpec::new("^BVSP", "Ibovespa").display_name(), "Ibovespa");
        assert_eq!(TickerSpec::new("^BVSP", "").display_name(), "^BVSP");
        assert_eq!(TickerSpec::new("^BVSP", "   ").display_name(), "^BVSP");
    }
}
