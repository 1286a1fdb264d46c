use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::errors::ReportError;
use crate::models::NewsArticle;

/// Configuration for the optional news section of the report.
#[derive(Debug, Clone)]
pub struct NewsConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub max_items: usize,
}

impl NewsConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var("NEWS_ENABLED")
                .ok()
                .and_then(|s| s.parse::<bool>().ok())
                .unwrap_or(false),
            api_key: std::env::var("NEWS_API_KEY").ok(),
            max_items: std::env::var("NEWS_MAX_ITEMS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        }
    }

    /// A provider when news is enabled and a key is present, otherwise the
    /// report simply ships without a news section.
    pub fn provider(&self) -> Option<Arc<dyn NewsProvider>> {
        if !self.enabled {
            return None;
        }
        match &self.api_key {
            Some(key) => Some(Arc::new(SerperProvider::new(key.clone()))),
            None => {
                error!("NEWS_ENABLED is true but NEWS_API_KEY is not set, news disabled");
                None
            }
        }
    }
}

/// Trait for news providers
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn fetch_news(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<NewsArticle>, ReportError>;
}

/// Serper API provider (uses Google's news search)
pub struct SerperProvider {
    api_key: String,
    client: Client,
}

impl SerperProvider {
    pub fn new(api_key: String) -> Self {
        Self { api_key, client: Client::new() }
    }
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    news: Option<Vec<SerperNewsItem>>,
}

#[derive(Debug, Deserialize)]
struct SerperNewsItem {
    title: String,
    link: String,
    source: String,
    #[serde(rename = "imageUrl")]
    image_url: Option<String>,
}

#[async_trait]
impl NewsProvider for SerperProvider {
    async fn fetch_news(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<NewsArticle>, ReportError> {
        info!("Fetching news for query: {}", query);

        let request_body = serde_json::json!({
            "q": query,
            "num": max_results.min(100), // Serper max is 100
        });

        let response = self
            .client
            .post("https://google.serper.dev/news")
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!("News API request failed: {}", e);
                ReportError::External(format!("news API error: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("News API error {}: {}", status, error_text);
            return Err(ReportError::External(format!(
                "news API returned {status}: {error_text}"
            )));
        }

        let body: SerperResponse = response.json().await.map_err(|e| {
            error!("Failed to parse news response: {}", e);
            ReportError::External(format!("failed to parse news response: {e}"))
        })?;

        let articles = body
            .news
            .unwrap_or_default()
            .into_iter()
            .take(max_results)
            .map(|item| NewsArticle {
                title: item.title,
                url: item.link,
                source: item.source,
                image: item.image_url,
            })
            .collect();

        Ok(articles)
    }
}
