use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::types::{Article, NewArticle, Page};
use crate::Result;

/// The article row store.
#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Insert a row and return it with its assigned id
    async fn store_article(&self, article: &NewArticle) -> Result<Article>;

    /// Most recent row for `source_url` created at or after `since`
    async fn find_recent_by_source_url(
        &self,
        source_url: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<Article>>;

    /// Articles ordered by `created_at`, newest first
    async fn list_articles(&self, page: Page) -> Result<Vec<Article>>;
}

/// The blob store holding article images.
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Store `bytes` under `key` and return the stored key.
    async fn upload_image(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String>;

    /// Public URL for a stored key.
    fn image_url(&self, key: &str) -> String;
}
