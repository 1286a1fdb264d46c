use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::warn;

use crate::errors::ReportError;
use crate::models::{
    ChartArtifact, MarketDataset, NewsArticle, PeriodReturn, ReportData, SnapshotEntry,
    TickerSection, TickerSpec,
};
use crate::services::template::TemplateRenderer;

/// Merges returns, chart references and news into one `ReportData`, then
/// renders it into the channel payloads. No I/O here beyond the template
/// seam; image bytes are only ever touched by the email channel.
pub struct ReportAssembler {
    template: Arc<dyn TemplateRenderer>,
}

impl ReportAssembler {
    pub fn new(template: Arc<dyn TemplateRenderer>) -> Self {
        Self { template }
    }

    pub fn assemble(
        &self,
        tickers: &[TickerSpec],
        returns: &HashMap<String, PeriodReturn>,
        charts: &[ChartArtifact],
        news: Vec<NewsArticle>,
        date: NaiveDate,
    ) -> ReportData {
        let sections = tickers
            .iter()
            .filter_map(|spec| {
                let Some(ret) = returns.get(&spec.symbol) else {
                    warn!("No return computed for {}, leaving it out of the report", spec.symbol);
                    return None;
                };
                let display_name = spec.display_name().to_string();
                Some(TickerSection {
                    symbol: spec.symbol.clone(),
                    headline: format!("The daily return for {display_name} was"),
                    display_name,
                    return_text: ret.text(),
                    return_pct: ret.pct,
                    sentiment: ret.sentiment(),
                    chart_cid: charts
                        .iter()
                        .find(|a| a.symbol == spec.symbol)
                        .map(|a| a.cid.clone()),
                })
            })
            .collect();

        ReportData { date, sections, news }
    }

    pub fn render_html(&self, data: &ReportData) -> Result<String, ReportError> {
        self.template.render("email", data)
    }

    /// Compact plain-text digest: date, then per ticker the signed return and
    /// the two most recent closes. Independent of the HTML path.
    pub fn render_digest(&self, data: &ReportData, dataset: &MarketDataset) -> String {
        let mut lines = vec![format!("Market report for {}", data.date_text()), String::new()];

        for section in &data.sections {
            match dataset.last_two(&section.symbol) {
                Some((prev, last)) => lines.push(format!(
                    "{}: {} | close {:.2} (prev {:.2})",
                    section.display_name, section.return_text, last.close, prev.close
                )),
                None => lines.push(format!("{}: {}", section.display_name, section.return_text)),
            }
        }

        lines.join("\n")
    }

    /// The last-run JSON snapshot, keyed by ticker. Writing it to disk is the
    /// caller's business.
    pub fn snapshot(&self, data: &ReportData, graphs_dir: &Path) -> BTreeMap<String, SnapshotEntry> {
        data.sections
            .iter()
            .map(|s| {
                (
                    s.symbol.clone(),
                    SnapshotEntry {
                        ticker: s.symbol.clone(),
                        ticker_fullname: s.display_name.clone(),
                        ticker_graph_path: s
                            .chart_cid
                            .as_ref()
                            .map(|cid| graphs_dir.join(cid).to_string_lossy().into_owned()),
                        ticker_return: s.return_text.clone(),
                    },
                )
            })
            .collect()
    }
}
