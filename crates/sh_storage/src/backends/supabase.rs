use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, Response};
use sh_core::{Article, ArticleStorage, Error, ImageStorage, NewArticle, Page, Result};
use std::fmt;
use url::Url;
use crate::{BackendConfig, StorageBackend};

/// Hosted backend: rows over PostgREST (`/rest/v1`), images over the
/// storage API (`/storage/v1`).
pub struct SupabaseStorage {
    client: Client,
    url: String,
    api_key: String,
    table: String,
    bucket: String,
}

impl fmt::Debug for SupabaseStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseStorage")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("table", &self.table)
            .field("bucket", &self.bucket)
            .finish()
    }
}

impl SupabaseStorage {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let url = config
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| Error::Config("Supabase URL is missing".to_string()))?;
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config("Supabase service key is missing".to_string()))?;
        Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;

        Ok(Self {
            client: Client::new(),
            url: url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            table: config.table.clone(),
            bucket: config.bucket.clone(),
        })
    }

    fn rest_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url, self.table)
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.url, self.bucket, key.trim_start_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn check(response: Response, action: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::Storage(format!("{} failed with {}: {}", action, status, body)))
    }

    async fn select(&self, query: &[(&str, String)], action: &str) -> Result<Vec<Article>> {
        let response = self
            .authorized(self.client.get(self.rest_url()))
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await?;
        let response = Self::check(response, action).await?;
        response
            .json::<Vec<Article>>()
            .await
            .map_err(|e| Error::Storage(format!("{} returned malformed rows: {}", action, e)))
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[async_trait]
impl StorageBackend for SupabaseStorage {
    fn get_error_message() -> &'static str {
        "Supabase needs a project URL and a service key"
    }

    async fn connect(config: &BackendConfig) -> Result<Self> {
        Self::new(config)
    }
}

#[async_trait]
impl ArticleStorage for SupabaseStorage {
    async fn store_article(&self, article: &NewArticle) -> Result<Article> {
        let row = serde_json::json!({
            "title": article.title,
            "ai_content": article.ai_content,
            "image_path": article.image_path,
            "source_url": article.source_url,
            "created_at": timestamp(article.created_at),
        });
        let response = self
            .authorized(self.client.post(self.rest_url()))
            .header("Prefer", "return=representation")
            .json(&[row])
            .send()
            .await?;
        let response = Self::check(response, "Article insert").await?;
        let rows = response
            .json::<Vec<Article>>()
            .await
            .map_err(|e| Error::Storage(format!("Article insert returned malformed rows: {}", e)))?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::Storage("Article insert returned no row".to_string()))
    }

    async fn find_recent_by_source_url(&self, source_url: &str, since: DateTime<Utc>) -> Result<Option<Article>> {
        let rows = self
            .select(
                &[
                    ("select", "*".to_string()),
                    ("source_url", format!("eq.{}", source_url)),
                    ("created_at", format!("gte.{}", timestamp(since))),
                    ("order", "created_at.desc".to_string()),
                    ("limit", "1".to_string()),
                ],
                "Duplicate lookup",
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn list_articles(&self, page: Page) -> Result<Vec<Article>> {
        self.select(
            &[
                ("select", "*".to_string()),
                ("order", "created_at.desc".to_string()),
                ("limit", page.limit().to_string()),
                ("offset", page.offset().to_string()),
            ],
            "Article listing",
        )
        .await
    }
}

#[async_trait]
impl ImageStorage for SupabaseStorage {
    async fn upload_image(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String> {
        let response = self
            .authorized(self.client.post(self.object_url(key)))
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(bytes.to_vec())
            .send()
            .await?;
        Self::check(response, "Image upload").await?;
        Ok(key.to_string())
    }

    fn image_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.url, self.bucket, key.trim_start_matches('/'))
    }
}
