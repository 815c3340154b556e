use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sh_core::{Article, ArticleStorage, Error, ImageStorage, NewArticle, Page, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;
use crate::{BackendConfig, StorageBackend};

const DEFAULT_DB_PATH: &str = "articles.db";

// `{table}` is substituted with the configured row table.
const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS {table} (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        ai_content TEXT NOT NULL,
        image_path TEXT,
        source_url TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS {table}_source_url_created_at
    ON {table} (source_url, created_at)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS images (
        key TEXT PRIMARY KEY,
        content_type TEXT NOT NULL,
        bytes BLOB NOT NULL
    )
    "#,
];

/// Local single-file backend. Rows and image blobs live in one database.
pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
    table: String,
}

fn timestamp(at: DateTime<Utc>) -> String {
    // Fixed width so text comparison matches time ordering.
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn validate_table(table: &str) -> Result<()> {
    if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(Error::Config(format!("Invalid table name '{}'", table)));
    }
    Ok(())
}

fn row_to_article(row: &SqliteRow) -> Result<Article> {
    let id: String = row.get("id");
    let created_at: String = row.get("created_at");
    Ok(Article {
        id: Uuid::parse_str(&id)
            .map_err(|e| Error::Storage(format!("Failed to parse id {}: {}", id, e)))?,
        title: row.get("title"),
        ai_content: row.get("ai_content"),
        image_path: row.get::<Option<String>, _>("image_path"),
        source_url: row.get("source_url"),
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| Error::Storage(format!("Failed to parse date: {}", e)))?
            .with_timezone(&Utc),
    })
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database should be available at ./articles.db"
    }

    async fn connect(config: &BackendConfig) -> Result<Self> {
        let db_path = PathBuf::from(config.url.as_deref().unwrap_or(DEFAULT_DB_PATH));
        Self::new_with_path(&db_path, &config.table).await
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path, table: &str) -> Result<Self> {
        validate_table(table)?;

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| Error::Storage(format!("Failed to connect to database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(&migration.replace("{table}", table))
                .execute(&pool)
                .await
                .map_err(|e| Error::Storage(format!("Failed to run migration {}: {}", i, e)))?;
        }

        Ok(Self {
            pool: Arc::new(pool),
            db_path: db_path.to_path_buf(),
            table: table.to_string(),
        })
    }
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn store_article(&self, article: &NewArticle) -> Result<Article> {
        let stored = article.clone().into_article(Uuid::new_v4());
        sqlx::query(&format!(
            "INSERT INTO {} (id, title, ai_content, image_path, source_url, created_at) VALUES (?, ?, ?, ?, ?, ?)",
            self.table
        ))
        .bind(stored.id.to_string())
        .bind(&stored.title)
        .bind(&stored.ai_content)
        .bind(stored.image_path.as_deref())
        .bind(&stored.source_url)
        .bind(timestamp(stored.created_at))
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::Storage(format!("Failed to store article: {}", e)))?;

        Ok(stored)
    }

    async fn find_recent_by_source_url(&self, source_url: &str, since: DateTime<Utc>) -> Result<Option<Article>> {
        let row = sqlx::query(&format!(
            "SELECT * FROM {} WHERE source_url = ? AND created_at >= ? ORDER BY created_at DESC LIMIT 1",
            self.table
        ))
        .bind(source_url)
        .bind(timestamp(since))
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| Error::Storage(format!("Failed to look up article: {}", e)))?;

        row.as_ref().map(row_to_article).transpose()
    }

    async fn list_articles(&self, page: Page) -> Result<Vec<Article>> {
        let rows = sqlx::query(&format!(
            "SELECT * FROM {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
            self.table
        ))
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Storage(format!("Failed to list articles: {}", e)))?;

        rows.iter().map(row_to_article).collect()
    }
}

#[async_trait]
impl ImageStorage for SQLiteStorage {
    async fn upload_image(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String> {
        sqlx::query("INSERT INTO images (key, content_type, bytes) VALUES (?, ?, ?)")
            .bind(key)
            .bind(content_type)
            .bind(bytes)
            .execute(&*self.pool)
            .await
            .map_err(|e| Error::Storage(format!("Failed to store image {}: {}", key, e)))?;
        Ok(key.to_string())
    }

    fn image_url(&self, key: &str) -> String {
        format!("sqlite://{}/images/{}", self.db_path.display(), key)
    }
}
