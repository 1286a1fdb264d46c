use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::NewsArticle;

/// Percent change between the two most recent closes, rounded to 2 decimals.
/// The sign lives in the number; rendering never forces one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodReturn {
    pub pct: f64,
}

impl PeriodReturn {
    pub fn between(prev: f64, last: f64) -> Self {
        let raw = (last - prev) / prev * 100.0;
        Self { pct: (raw * 100.0).round() / 100.0 }
    }

    pub fn text(&self) -> String {
        format!("{:.2}%", self.pct)
    }

    /// Strict greater-than-zero: a flat day reads as NonPositive.
    pub fn sentiment(&self) -> Sentiment {
        if self.pct > 0.0 {
            Sentiment::Positive
        } else {
            Sentiment::NonPositive
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    NonPositive,
}

impl Sentiment {
    /// Accent color used by the HTML template.
    pub fn color(&self) -> &'static str {
        match self {
            Sentiment::Positive => "green",
            Sentiment::NonPositive => "red",
        }
    }
}

/// One rendered trend chart. `cid` is the bare file name and doubles as the
/// inline-image content id the HTML references; `path` is where the renderer
/// wrote the PNG.
#[derive(Debug, Clone)]
pub struct ChartArtifact {
    pub symbol: String,
    pub cid: String,
    pub path: PathBuf,
}

impl ChartArtifact {
    /// The single place the chart file name is derived from a symbol, so the
    /// renderer, the assembler and the email channel cannot drift apart:
    /// lowercased, market-data punctuation (`^`, `=`, `.`) stripped.
    pub fn cid_for(symbol: &str) -> String {
        let base: String = symbol
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        format!("{base}.png")
    }

    pub fn new(symbol: &str, output_dir: &Path) -> Self {
        let cid = Self::cid_for(symbol);
        Self {
            symbol: symbol.to_string(),
            path: output_dir.join(&cid),
            cid,
        }
    }
}

/// One per-ticker block of the assembled report.
#[derive(Debug, Clone)]
pub struct TickerSection {
    pub symbol: String,
    pub display_name: String,
    pub headline: String,
    pub return_text: String,
    pub return_pct: f64,
    pub sentiment: Sentiment,
    pub chart_cid: Option<String>,
}

/// The assembled report, immutable once handed to rendering.
#[derive(Debug, Clone)]
pub struct ReportData {
    pub date: NaiveDate,
    pub sections: Vec<TickerSection>,
    pub news: Vec<NewsArticle>,
}

impl ReportData {
    pub fn date_text(&self) -> String {
        self.date.format("%d/%m/%Y").to_string()
    }

    pub fn subject(&self) -> String {
        format!("Market report for {}", self.date_text())
    }
}

/// Per-ticker entry of the last-run JSON snapshot written after assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub ticker: String,
    pub ticker_fullname: String,
    pub ticker_graph_path: Option<String>,
    pub ticker_return: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_rounds_to_two_decimals() {
        // (99 - 101) / 101 * 100 = -1.9801...
        let r = PeriodReturn::between(101.0, 99.0);
        assert_eq!(r.pct, -1.98);
        assert_eq!(r.text(), "-1.98%");
    }

    #[test]
    fn positive_return_keeps_numeric_sign_only() {
        let r = PeriodReturn::between(100.0, 102.5);
        assert_eq!(r.text(), "2.50%");
        assert_eq!(r.sentiment(), Sentiment::Positive);
    }

    #[test]
    fn zero_return_is_non_positive() {
        let r = PeriodReturn::between(100.0, 100.0);
        assert_eq!(r.pct, 0.0);
        assert_eq!(r.sentiment(), Sentiment::NonPositive);
        assert_eq!(r.sentiment().color(), "red");
    }

    #[test]
    fn cid_strips_symbol_punctuation() {
        assert_eq!(ChartArtifact::cid_for("^BVSP"), "bvsp.png");
        assert_eq!(ChartArtifact::cid_for("BRL=X"), "brlx.png");
        assert_eq!(ChartArtifact::cid_for("^GSPC"), "gspc.png");
    }

    #[test]
    fn artifact_path_lives_under_output_dir() {
        let a = ChartArtifact::new("^BVSP", Path::new("graphs"));
        assert_eq!(a.cid, "bvsp.png");
        assert_eq!(a.path, PathBuf::from("graphs/bvsp.png"));
    }
}
