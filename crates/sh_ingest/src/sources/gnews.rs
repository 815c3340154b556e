use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use sh_core::{Error, NewsItem, Result};
use std::fmt;
use url::Url;
use super::{NewsQuery, NewsSource};

pub const DEFAULT_BASE_URL: &str = "https://gnews.io/api/v4";

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    articles: Vec<GNewsArticle>,
}

#[derive(Deserialize)]
struct GNewsArticle {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    image: Option<String>,
}

impl From<GNewsArticle> for NewsItem {
    fn from(article: GNewsArticle) -> Self {
        NewsItem {
            headline: article.title,
            source_url: article.url,
            image_url: article.image.filter(|i| !i.trim().is_empty()),
        }
    }
}

/// Client for the GNews v4 search endpoint.
pub struct GNewsSource {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl fmt::Debug for GNewsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GNewsSource")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn api_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

impl GNewsSource {
    pub fn new(api_key: Option<String>, base_url: Option<String>) -> Result<Self> {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Url::parse(&base_url).map_err(|e| Error::InvalidUrl(format!("{}: {}", base_url, e)))?;
        Ok(Self {
            client: Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn search_params(&self, query: &NewsQuery, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("q", query.topic.clone()),
            ("lang", query.language.clone()),
            ("from", api_time(query.from)),
            ("to", api_time(query.to)),
            ("max", query.max.to_string()),
            ("apikey", api_key.to_string()),
        ]
    }
}

#[async_trait]
impl NewsSource for GNewsSource {
    fn name(&self) -> &str {
        "GNews"
    }

    async fn search(&self, query: &NewsQuery) -> Result<Vec<NewsItem>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("GNews API key is missing".to_string()))?;

        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&self.search_params(query, api_key))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::NewsSource(format!(
                "GNews API fetch failed: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )));
        }

        let body = response
            .json::<SearchResponse>()
            .await
            .map_err(|e| Error::NewsSource(format!("GNews API returned a malformed body: {}", e)))?;
        tracing::debug!("GNews returned {} articles for '{}'", body.articles.len(), query.topic);
        Ok(body.articles.into_iter().map(NewsItem::from).collect())
    }
}
