use std::path::Path;

use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use tracing::{debug, warn};

use crate::errors::ReportError;
use crate::models::{ChartArtifact, MarketDataset, PricePoint};

/// Fixed visual style for every chart in a run. Built once at startup and
/// passed into the renderer, so concurrent report instances can never leak
/// style into each other.
#[derive(Debug, Clone)]
pub struct ChartTheme {
    pub background: RGBColor,
    pub foreground: RGBColor,
    pub grid: RGBColor,
    pub line: RGBColor,
    pub width: u32,
    pub height: u32,
}

impl Default for ChartTheme {
    /// Dark palette with a neon trace, after the look of the original
    /// report's charts.
    fn default() -> Self {
        Self {
            background: RGBColor(33, 41, 70),
            foreground: RGBColor(217, 217, 217),
            grid: RGBColor(42, 52, 89),
            line: RGBColor(8, 247, 254),
            width: 800,
            height: 450,
        }
    }
}

/// What to do when one ticker's chart cannot be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartFailurePolicy {
    /// Fail the whole run with `ReportError::Render`.
    Abort,
    /// Log, drop that ticker's chart, keep its return text in the report.
    Skip,
}

impl ChartFailurePolicy {
    pub fn from_env() -> Self {
        match std::env::var("CHART_FAILURE_POLICY")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "abort" => ChartFailurePolicy::Abort,
            _ => ChartFailurePolicy::Skip,
        }
    }
}

pub struct ChartRenderer {
    theme: ChartTheme,
    policy: ChartFailurePolicy,
}

impl ChartRenderer {
    pub fn new(theme: ChartTheme, policy: ChartFailurePolicy) -> Self {
        Self { theme, policy }
    }

    /// One PNG per ticker, restricted to the trailing `window_days` before
    /// `today`. Files land at `output_dir/<cid>` and are overwritten each
    /// run. Under the Skip policy a ticker that fails to draw is simply
    /// absent from the returned artifacts.
    pub fn render_charts(
        &self,
        dataset: &MarketDataset,
        window_days: i64,
        output_dir: &Path,
        today: NaiveDate,
    ) -> Result<Vec<ChartArtifact>, ReportError> {
        std::fs::create_dir_all(output_dir).map_err(|e| {
            ReportError::Render(format!("cannot create {}: {e}", output_dir.display()))
        })?;

        let cutoff = today - Duration::days(window_days);
        let mut artifacts = Vec::new();

        for symbol in dataset.symbols() {
            let points = dataset.series_from(symbol, cutoff).unwrap_or_default();
            let artifact = ChartArtifact::new(symbol, output_dir);

            match self.draw(symbol, &points, &artifact.path) {
                Ok(()) => {
                    debug!("Chart written: {}", artifact.path.display());
                    artifacts.push(artifact);
                }
                Err(e) => match self.policy {
                    ChartFailurePolicy::Abort => {
                        return Err(ReportError::Render(format!("{symbol}: {e}")));
                    }
                    ChartFailurePolicy::Skip => {
                        warn!("Skipping chart for {}: {}", symbol, e);
                    }
                },
            }
        }

        Ok(artifacts)
    }

    // The drawing area lives only inside this call: each ticker gets a fresh
    // canvas that is presented and dropped before the next one, so memory
    // stays bounded over an arbitrarily long ticker list.
    fn draw(&self, symbol: &str, points: &[PricePoint], path: &Path) -> Result<(), String> {
        if points.len() < 2 {
            return Err(format!("{} points in display window, need at least 2", points.len()));
        }

        let first = points[0].date;
        let last = points[points.len() - 1].date;
        let (mut lo, mut hi) = points.iter().fold((f64::MAX, f64::MIN), |(lo, hi), p| {
            (lo.min(p.close), hi.max(p.close))
        });
        let pad = ((hi - lo) * 0.05).max(hi.abs() * 0.001).max(1e-6);
        lo -= pad;
        hi += pad;

        let root = BitMapBackend::new(path, (self.theme.width, self.theme.height))
            .into_drawing_area();
        root.fill(&self.theme.background).map_err(|e| e.to_string())?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                symbol,
                ("sans-serif", 24).into_font().color(&self.theme.foreground),
            )
            .margin(12)
            .x_label_area_size(28)
            .y_label_area_size(56)
            .build_cartesian_2d(first..last, lo..hi)
            .map_err(|e| e.to_string())?;

        chart
            .configure_mesh()
            .axis_style(&self.theme.grid)
            .bold_line_style(&self.theme.grid)
            .light_line_style(&self.theme.background)
            .label_style(("sans-serif", 13).into_font().color(&self.theme.foreground))
            .x_labels(6)
            .x_label_formatter(&|d| d.format("%d/%m").to_string())
            .draw()
            .map_err(|e| e.to_string())?;

        chart
            .draw_series(LineSeries::new(
                points.iter().map(|p| (p.date, p.close)),
                self.theme.line.stroke_width(2),
            ))
            .map_err(|e| e.to_string())?;

        root.present().map_err(|e| e.to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::market_data_service::align;
    use crate::external::price_provider::ExternalPricePoint;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
    }

    fn dataset() -> MarketDataset {
        align(vec![(
            "SPX".to_string(),
            vec![
                ExternalPricePoint { date: day(1), close: 200.0 },
                ExternalPricePoint { date: day(2), close: 202.0 },
                ExternalPricePoint { date: day(3), close: 198.0 },
            ],
        )])
        .unwrap()
    }

    #[test]
    fn skip_policy_omits_unrenderable_tickers() {
        let renderer = ChartRenderer::new(ChartTheme::default(), ChartFailurePolicy::Skip);
        let dir = std::env::temp_dir().join("marketbrief-chart-skip-test");
        // Window entirely in the future: every ticker has an empty slice.
        let artifacts = renderer
            .render_charts(&dataset(), 7, &dir, day(31))
            .unwrap();
        assert!(artifacts.is_empty());
    }

    #[test]
    fn abort_policy_turns_draw_failure_into_render_error() {
        let renderer = ChartRenderer::new(ChartTheme::default(), ChartFailurePolicy::Abort);
        let dir = std::env::temp_dir().join("marketbrief-chart-abort-test");
        let err = renderer
            .render_charts(&dataset(), 7, &dir, day(31))
            .unwrap_err();
        assert!(matches!(err, ReportError::Render(_)));
    }

    #[test]
    fn failure_policy_parses_from_env_string() {
        std::env::set_var("CHART_FAILURE_POLICY", "abort");
        assert_eq!(ChartFailurePolicy::from_env(), ChartFailurePolicy::Abort);
        std::env::set_var("CHART_FAILURE_POLICY", "skip");
        assert_eq!(ChartFailurePolicy::from_env(), ChartFailurePolicy::Skip);
        std::env::remove_var("CHART_FAILURE_POLICY");
    }
}
