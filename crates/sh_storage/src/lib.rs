use async_trait::async_trait;
use sh_core::{ArticleStorage, Error, ImageStorage, Result};
use std::fmt;
use std::sync::Arc;

pub mod backends;

pub use backends::*;

pub const DEFAULT_TABLE: &str = "ai_articles";
pub const DEFAULT_BUCKET: &str = "news-images";

/// A backend that serves both the article rows and the image blobs.
#[async_trait]
pub trait StorageBackend: ArticleStorage + ImageStorage {
    fn get_error_message() -> &'static str where Self: Sized;
    async fn connect(config: &BackendConfig) -> Result<Self> where Self: Sized;
}

#[derive(Clone)]
pub struct BackendConfig {
    /// Project URL for REST backends, database path for sqlite
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub table: String,
    pub bucket: String,
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("table", &self.table)
            .field("bucket", &self.bucket)
            .finish()
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            table: DEFAULT_TABLE.to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
        }
    }
}

impl BackendConfig {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }
}

/// Row and blob handles for a single backend.
#[derive(Clone)]
pub struct Storage {
    pub articles: Arc<dyn ArticleStorage>,
    pub images: Arc<dyn ImageStorage>,
}

impl Storage {
    pub fn from_backend<B: StorageBackend + 'static>(backend: B) -> Self {
        let backend = Arc::new(backend);
        Self {
            articles: backend.clone(),
            images: backend,
        }
    }
}

async fn connect<B: StorageBackend + 'static>(config: &BackendConfig) -> Result<Storage> {
    let backend = B::connect(config).await.map_err(|e| {
        tracing::error!("{}: {}", B::get_error_message(), e);
        e
    })?;
    Ok(Storage::from_backend(backend))
}

pub async fn create_storage(kind: &str, config: &BackendConfig) -> Result<Storage> {
    match kind {
        "memory" => connect::<MemoryStorage>(config).await,
        "supabase" => connect::<SupabaseStorage>(config).await,
        #[cfg(feature = "sqlite")]
        "sqlite" => connect::<SQLiteStorage>(config).await,
        other => Err(Error::Config(format!(
            "Unknown storage backend '{}'. Available backends: {}",
            other,
            available_backends().join(", ")
        ))),
    }
}

pub fn available_backends() -> Vec<&'static str> {
    let mut backends = vec!["supabase", "memory"];
    if cfg!(feature = "sqlite") {
        backends.push("sqlite");
    }
    backends
}

pub mod prelude {
    pub use super::{create_storage, BackendConfig, Storage, StorageBackend};
    pub use super::backends::*;
}
