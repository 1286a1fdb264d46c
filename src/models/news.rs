use serde::{Deserialize, Serialize};

/// A single market-news headline shown at the bottom of the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
    pub source: String,
    pub image: Option<String>,
}
