use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sh_core::{Error, NewsItem, Result};

pub mod gnews;

pub use gnews::GNewsSource;

/// A topic search bounded to a time range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsQuery {
    pub topic: String,
    pub language: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub max: u32,
}

impl NewsQuery {
    /// Everything published since UTC midnight of `now`'s day.
    pub fn today(topic: &str, language: &str, max: u32, now: DateTime<Utc>) -> Self {
        let midnight = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|t| t.and_utc())
            .unwrap_or(now);
        Self {
            topic: topic.to_string(),
            language: language.to_string(),
            from: midnight,
            to: now,
            max,
        }
    }
}

#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Returns the name of the news API
    fn name(&self) -> &str;

    /// Items matching the query, in the order the API ranks them
    async fn search(&self, query: &NewsQuery) -> Result<Vec<NewsItem>>;
}

/// Serves a fixed list of items, or a fixed failure. Used for dry runs and
/// tests where no news API is reachable.
pub struct StaticNewsSource {
    items: Vec<NewsItem>,
    failure: Option<String>,
}

impl StaticNewsSource {
    pub fn new(items: Vec<NewsItem>) -> Self {
        Self { items, failure: None }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            failure: Some(message.into()),
        }
    }
}

#[async_trait]
impl NewsSource for StaticNewsSource {
    fn name(&self) -> &str {
        "Static"
    }

    async fn search(&self, query: &NewsQuery) -> Result<Vec<NewsItem>> {
        if let Some(message) = &self.failure {
            return Err(Error::NewsSource(message.clone()));
        }
        Ok(self.items.iter().take(query.max as usize).cloned().collect())
    }
}
