use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sh_core::{Article, ArticleStorage, ImageStorage, NewArticle, Page, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use crate::{BackendConfig, StorageBackend};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Default)]
pub struct MemoryStore {
    articles: Vec<Article>,
    images: HashMap<String, StoredImage>,
}

impl MemoryStore {
    pub fn store_article(&mut self, article: &NewArticle) -> Article {
        let article = article.clone().into_article(Uuid::new_v4());
        self.articles.push(article.clone());
        article
    }

    pub fn find_recent_by_source_url(&self, source_url: &str, since: DateTime<Utc>) -> Option<Article> {
        self.articles
            .iter()
            .filter(|a| a.source_url == source_url && a.created_at >= since)
            .max_by_key(|a| a.created_at)
            .cloned()
    }

    pub fn list_articles(&self, page: Page) -> Vec<Article> {
        let mut articles = self.articles.clone();
        articles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        articles
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect()
    }
}

/// Process-local backend for tests and dry runs. Nothing survives a restart.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored row, in insertion order.
    pub async fn articles(&self) -> Vec<Article> {
        self.store.read().await.articles.clone()
    }

    pub async fn image(&self, key: &str) -> Option<StoredImage> {
        self.store.read().await.images.get(key).cloned()
    }

    pub async fn image_count(&self) -> usize {
        self.store.read().await.images.len()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn connect(_config: &BackendConfig) -> Result<Self> {
        Ok(Self::new())
    }
}

#[async_trait]
impl ArticleStorage for MemoryStorage {
    async fn store_article(&self, article: &NewArticle) -> Result<Article> {
        let mut store = self.store.write().await;
        Ok(store.store_article(article))
    }

    async fn find_recent_by_source_url(&self, source_url: &str, since: DateTime<Utc>) -> Result<Option<Article>> {
        let store = self.store.read().await;
        Ok(store.find_recent_by_source_url(source_url, since))
    }

    async fn list_articles(&self, page: Page) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        Ok(store.list_articles(page))
    }
}

#[async_trait]
impl ImageStorage for MemoryStorage {
    async fn upload_image(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String> {
        let mut store = self.store.write().await;
        store.images.insert(
            key.to_string(),
            StoredImage {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(key.to_string())
    }

    fn image_url(&self, key: &str) -> String {
        format!("memory://{}", key)
    }
}
