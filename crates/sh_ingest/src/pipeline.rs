use chrono::{DateTime, Duration, Utc};
use sh_core::{Article, InferenceModel, NewArticle, NewsItem, Result};
use sh_inference::writer::{clean_headline, ArticleWriter, DEFAULT_BODY_MAX_TOKENS, DEFAULT_TITLE_MAX_TOKENS};
use sh_storage::Storage;
use std::fmt;
use std::sync::Arc;

use crate::images::{image_mime, new_image_key, parse_image_url, HttpImageFetcher, ImageFetcher};
use crate::logging::Logger;
use crate::quality::rejection_phrase;
use crate::report::{IngestAborted, IngestReport, LogEntry};
use crate::sources::{NewsQuery, NewsSource};

#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Search term, also the keyword every headline must contain
    pub topic: String,
    pub language: String,
    pub page_size: u32,
    /// How far back a stored `source_url` counts as a duplicate
    pub dedup_window: Duration,
    pub image_prefix: String,
    pub body_max_tokens: u32,
    pub title_max_tokens: u32,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            topic: "Taylor Swift".to_string(),
            language: "en".to_string(),
            page_size: 10,
            dedup_window: Duration::hours(24),
            image_prefix: "news-images".to_string(),
            body_max_tokens: DEFAULT_BODY_MAX_TOKENS,
            title_max_tokens: DEFAULT_TITLE_MAX_TOKENS,
        }
    }
}

impl IngestConfig {
    pub fn summary_message(&self) -> String {
        format!("{} news articles stored successfully!", self.topic)
    }

    /// Earliest `created_at` that still counts as a duplicate. A window
    /// reaching past the calendar range covers all stored rows.
    pub fn dedup_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.dedup_window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn is_relevant(&self, headline: &str) -> bool {
        headline.to_lowercase().contains(&self.topic.to_lowercase())
    }
}

enum ItemOutcome {
    Skipped(LogEntry),
    Inserted(Article),
}

enum ImageOutcome {
    Stored(String),
    Unavailable(String),
}

/// Turns the day's news for one topic into stored articles.
///
/// Items are handled one at a time and a row is only written once every
/// earlier step for that item has succeeded, so a skipped item never leaves
/// a partial row behind. Uploaded images of items skipped later on stay in
/// the blob store.
pub struct IngestPipeline {
    source: Arc<dyn NewsSource>,
    storage: Storage,
    fetcher: Arc<dyn ImageFetcher>,
    writer: ArticleWriter,
    config: IngestConfig,
}

impl fmt::Debug for IngestPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestPipeline")
            .field("source", &self.source.name())
            .field("writer", &self.writer)
            .field("config", &self.config)
            .finish()
    }
}

impl IngestPipeline {
    pub fn new(
        source: Arc<dyn NewsSource>,
        storage: Storage,
        model: Arc<dyn InferenceModel>,
        config: IngestConfig,
    ) -> Self {
        let writer = ArticleWriter::new(model)
            .with_token_limits(config.body_max_tokens, config.title_max_tokens);
        Self {
            source,
            storage,
            fetcher: Arc::new(HttpImageFetcher::new()),
            writer,
            config,
        }
    }

    pub fn with_image_fetcher(mut self, fetcher: Arc<dyn ImageFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Run one ingestion pass.
    ///
    /// Per-item failures are logged and skipped. The run aborts only if the
    /// news search fails or a collaborator reports missing configuration.
    pub async fn run(&self) -> std::result::Result<IngestReport, IngestAborted> {
        let logger = Logger::new().with_prefix(format!("[{}]", self.source.name()));
        let mut logs = Vec::new();

        let query = NewsQuery::today(&self.config.topic, &self.config.language, self.config.page_size, Utc::now());
        logger.info(&format!("Searching news for '{}' since {}", query.topic, query.from.to_rfc3339()));
        let items = match self.source.search(&query).await {
            Ok(items) => items,
            Err(error) => {
                logger.error(&format!("News search failed: {}", error));
                return Err(IngestAborted { error, logs });
            }
        };
        logger.info(&format!("Fetched {} items", items.len()));

        let total = items.len();
        let mut inserted = Vec::new();
        for (i, item) in items.iter().enumerate() {
            let item_logger = logger.clone().with_prefix(format!("[{}/{}]", i + 1, total));
            match self.process_item(item, &item_logger).await {
                Ok(ItemOutcome::Skipped(entry)) => {
                    item_logger.info(&entry.message);
                    logs.push(entry);
                }
                Ok(ItemOutcome::Inserted(article)) => {
                    let entry = LogEntry::inserted(&article);
                    item_logger.info(&entry.message);
                    logs.push(entry);
                    inserted.push(article);
                }
                Err(error) if error.is_config() => {
                    item_logger.error(&format!("Aborting run: {}", error));
                    logs.push(LogEntry::failed(&item.headline, &error));
                    return Err(IngestAborted { error, logs });
                }
                Err(error) => {
                    let entry = LogEntry::failed(&item.headline, &error);
                    item_logger.warn(&entry.message);
                    logs.push(entry);
                }
            }
        }

        logger.info(&format!("Run complete: {} of {} items inserted", inserted.len(), total));
        Ok(IngestReport {
            message: self.config.summary_message(),
            logs,
            inserted,
        })
    }

    async fn process_item(&self, item: &NewsItem, logger: &Logger) -> Result<ItemOutcome> {
        logger.debug(&format!("Processing: {}", item.headline));

        if !self.config.is_relevant(&item.headline) {
            return Ok(ItemOutcome::Skipped(LogEntry::irrelevant(&item.headline)));
        }

        let since = self.config.dedup_cutoff(Utc::now());
        if let Some(existing) = self
            .storage
            .articles
            .find_recent_by_source_url(&item.source_url, since)
            .await?
        {
            return Ok(ItemOutcome::Skipped(LogEntry::duplicate(&item.headline, &existing)));
        }

        let image_path = match self.acquire_image(item, logger).await? {
            ImageOutcome::Stored(key) => key,
            ImageOutcome::Unavailable(reason) => {
                return Ok(ItemOutcome::Skipped(LogEntry::no_image(&item.headline, &reason)));
            }
        };

        let ai_content = match self.writer.write_body(&item.headline, &item.source_url).await {
            Ok(content) => content,
            Err(error) if error.is_config() => return Err(error),
            Err(error) => {
                return Ok(ItemOutcome::Skipped(LogEntry::generation_failed(&item.headline, &error)));
            }
        };

        if let Some(phrase) = rejection_phrase(&ai_content) {
            return Ok(ItemOutcome::Skipped(LogEntry::low_quality(&item.headline, phrase)));
        }

        let title = match self.writer.rewrite_headline(&item.headline).await {
            Ok(title) => title,
            Err(error) if error.is_config() => return Err(error),
            Err(error) => {
                logger.warn(&format!("Headline rewrite failed, keeping original: {}", error));
                fallback_title(&item.headline)
            }
        };

        let article = NewArticle {
            title,
            ai_content,
            image_path: Some(image_path),
            source_url: item.source_url.clone(),
            created_at: Utc::now(),
        };
        let stored = self.storage.articles.store_article(&article).await?;
        Ok(ItemOutcome::Inserted(stored))
    }

    async fn acquire_image(&self, item: &NewsItem, logger: &Logger) -> Result<ImageOutcome> {
        let url = match parse_image_url(item.image_url.as_deref()) {
            Some(url) => url,
            None => {
                let reason = match item.image_url.as_deref() {
                    Some(raw) => format!("not an http(s) URL: {}", raw),
                    None => "no image URL".to_string(),
                };
                return Ok(ImageOutcome::Unavailable(reason));
            }
        };

        let image = match self.fetcher.fetch(&url).await {
            Ok(image) => image,
            Err(error) => return Ok(ImageOutcome::Unavailable(format!("fetch failed: {}", error))),
        };

        let mime = match image_mime(image.content_type.as_deref()) {
            Some(mime) if !image.bytes.is_empty() => mime,
            Some(_) => return Ok(ImageOutcome::Unavailable("empty image body".to_string())),
            None => {
                return Ok(ImageOutcome::Unavailable(format!(
                    "content type {} is not an image",
                    image.content_type.as_deref().unwrap_or("<missing>")
                )));
            }
        };

        let key = new_image_key(&self.config.image_prefix, &mime);
        let stored = self.storage.images.upload_image(&key, &image.bytes, &mime).await?;
        logger.debug(&format!("Stored {} bytes of {} as {}", image.bytes.len(), mime, stored));
        Ok(ImageOutcome::Stored(stored))
    }
}

/// Original headline, cleaned the same way a rewrite would be.
fn fallback_title(headline: &str) -> String {
    let cleaned = clean_headline(headline);
    if cleaned.is_empty() {
        headline.trim().to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::FetchedImage;
    use crate::report::LogKind;
    use crate::sources::StaticNewsSource;
    use async_trait::async_trait;
    use sh_core::{ArticleStorage, CompletionRequest, Error, ImageStorage, Page};
    use sh_inference::models::DummyModel;
    use sh_inference::writer::{HEADLINE_EDITOR_PROMPT, JOURNALIST_PROMPT};
    use sh_storage::backends::memory::MemoryStorage;
    use std::collections::HashMap;
    use url::Url;

    const ALBUM_URL: &str = "https://news.example.com/taylor-swift-album";
    const ALBUM_IMAGE: &str = "https://img.example.com/album.jpg";

    /// Serves canned responses keyed by URL; unknown URLs fail.
    struct StaticImageFetcher {
        images: HashMap<String, FetchedImage>,
    }

    impl StaticImageFetcher {
        fn new() -> Self {
            Self { images: HashMap::new() }
        }

        fn with(mut self, url: &str, content_type: &str, bytes: &[u8]) -> Self {
            self.images.insert(
                url.to_string(),
                FetchedImage {
                    bytes: bytes.to_vec(),
                    content_type: Some(content_type.to_string()),
                },
            );
            self
        }
    }

    #[async_trait]
    impl ImageFetcher for StaticImageFetcher {
        async fn fetch(&self, url: &Url) -> Result<FetchedImage> {
            self.images
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| Error::External(anyhow::anyhow!("connection refused: {}", url)))
        }
    }

    fn album_item() -> NewsItem {
        NewsItem::new("Taylor Swift announces new album", ALBUM_URL, Some(ALBUM_IMAGE.to_string()))
    }

    fn jpeg_fetcher() -> StaticImageFetcher {
        StaticImageFetcher::new().with(ALBUM_IMAGE, "image/jpeg", &[0xFF, 0xD8, 0xFF])
    }

    fn writer_model<B, T>(body: B, title: T) -> Arc<DummyModel>
    where
        B: Fn() -> Result<String> + Send + Sync + 'static,
        T: Fn() -> Result<String> + Send + Sync + 'static,
    {
        Arc::new(DummyModel::with_responder(move |request: &CompletionRequest| {
            if request.system_prompt == JOURNALIST_PROMPT {
                body()
            } else if request.system_prompt == HEADLINE_EDITOR_PROMPT {
                title()
            } else {
                Err(Error::Inference("unexpected prompt".to_string()))
            }
        }))
    }

    fn healthy_model() -> Arc<DummyModel> {
        writer_model(
            || Ok("Taylor Swift revealed plans for her next studio album on Tuesday.".to_string()),
            || Ok("\"Taylor Swift Unveils Her Next Album\"".to_string()),
        )
    }

    fn pipeline(
        items: Vec<NewsItem>,
        memory: &MemoryStorage,
        model: Arc<DummyModel>,
        fetcher: StaticImageFetcher,
    ) -> IngestPipeline {
        IngestPipeline::new(
            Arc::new(StaticNewsSource::new(items)),
            Storage::from_backend(memory.clone()),
            model,
            IngestConfig::default(),
        )
        .with_image_fetcher(Arc::new(fetcher))
    }

    fn kinds(report: &IngestReport) -> Vec<LogKind> {
        report.logs.iter().map(|entry| entry.kind).collect()
    }

    #[tokio::test]
    async fn test_inserts_relevant_article() {
        let memory = MemoryStorage::new();
        let model = healthy_model();
        let report = pipeline(vec![album_item()], &memory, model.clone(), jpeg_fetcher())
            .run()
            .await
            .unwrap();

        assert_eq!(report.message, "Taylor Swift news articles stored successfully!");
        assert_eq!(kinds(&report), vec![LogKind::Inserted]);

        let rows = memory.articles().await;
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.title, "Taylor Swift Unveils Her Next Album");
        assert_eq!(row.source_url, ALBUM_URL);
        assert!(!row.ai_content.is_empty());

        let key = row.image_path.as_deref().unwrap();
        assert!(key.starts_with("news-images/") && key.ends_with(".jpg"));
        let image = memory.image(key).await.unwrap();
        assert_eq!(image.bytes, vec![0xFF, 0xD8, 0xFF]);
        assert_eq!(image.content_type, "image/jpeg");
        assert_eq!(memory.image_url(key), format!("memory://{}", key));

        // body first, then the headline rewrite
        let calls = model.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].max_tokens, 200);
        assert!(calls[0].user_message.contains(ALBUM_URL));
        assert_eq!(calls[1].max_tokens, 50);
    }

    #[tokio::test]
    async fn test_skips_unrelated_headlines() {
        let memory = MemoryStorage::new();
        let items = vec![
            NewsItem::new("Local weather turns cold", "https://news.example.com/weather", Some(ALBUM_IMAGE.to_string())),
            NewsItem::new("TAYLOR SWIFT tour dates", "https://news.example.com/tour", None),
        ];
        let model = healthy_model();
        let report = pipeline(items, &memory, model.clone(), jpeg_fetcher()).run().await.unwrap();

        assert_eq!(kinds(&report), vec![LogKind::SkippedIrrelevant, LogKind::SkippedNoImage]);
        assert_eq!(report.logs[0].message, "Skipping unrelated article: Local weather turns cold");
        assert!(memory.articles().await.is_empty());
        assert!(model.calls().is_empty());
    }

    #[tokio::test]
    async fn test_skips_recent_duplicate() {
        let memory = MemoryStorage::new();
        memory
            .store_article(&NewArticle {
                title: "Earlier copy".to_string(),
                ai_content: "Already written.".to_string(),
                image_path: None,
                source_url: ALBUM_URL.to_string(),
                created_at: Utc::now() - Duration::hours(1),
            })
            .await
            .unwrap();

        let model = healthy_model();
        let report = pipeline(vec![album_item()], &memory, model.clone(), jpeg_fetcher())
            .run()
            .await
            .unwrap();

        assert_eq!(kinds(&report), vec![LogKind::SkippedDuplicate]);
        assert_eq!(memory.articles().await.len(), 1);
        assert_eq!(memory.image_count().await, 0);
        assert!(model.calls().is_empty());
    }

    #[tokio::test]
    async fn test_stale_copy_is_not_a_duplicate() {
        let memory = MemoryStorage::new();
        memory
            .store_article(&NewArticle {
                title: "Last week".to_string(),
                ai_content: "Old news.".to_string(),
                image_path: None,
                source_url: ALBUM_URL.to_string(),
                created_at: Utc::now() - Duration::hours(25),
            })
            .await
            .unwrap();

        let report = pipeline(vec![album_item()], &memory, healthy_model(), jpeg_fetcher())
            .run()
            .await
            .unwrap();
        assert_eq!(kinds(&report), vec![LogKind::Inserted]);
        assert_eq!(memory.articles().await.len(), 2);
    }

    #[tokio::test]
    async fn test_second_run_inserts_nothing() {
        let memory = MemoryStorage::new();
        let items = vec![
            album_item(),
            NewsItem::new(
                "Taylor Swift shares tour photos",
                "https://news.example.com/taylor-swift-photos",
                Some(ALBUM_IMAGE.to_string()),
            ),
        ];
        let pipeline = pipeline(items, &memory, healthy_model(), jpeg_fetcher());

        let first = pipeline.run().await.unwrap();
        assert_eq!(first.count(LogKind::Inserted), 2);

        let second = pipeline.run().await.unwrap();
        assert_eq!(kinds(&second), vec![LogKind::SkippedDuplicate, LogKind::SkippedDuplicate]);
        assert_eq!(memory.articles().await.len(), 2);
    }

    #[tokio::test]
    async fn test_requires_a_real_image() {
        let memory = MemoryStorage::new();
        let items = vec![
            NewsItem::new("Taylor Swift no image", "https://news.example.com/1", None),
            NewsItem::new("Taylor Swift ftp image", "https://news.example.com/2", Some("ftp://img.example.com/a.jpg".to_string())),
            NewsItem::new("Taylor Swift html image", "https://news.example.com/3", Some("https://img.example.com/page".to_string())),
            NewsItem::new("Taylor Swift broken image", "https://news.example.com/4", Some("https://img.example.com/missing.jpg".to_string())),
        ];
        let fetcher = StaticImageFetcher::new().with("https://img.example.com/page", "text/html; charset=utf-8", b"<html>");
        let report = pipeline(items, &memory, healthy_model(), fetcher).run().await.unwrap();

        assert_eq!(report.count(LogKind::SkippedNoImage), 4);
        assert!(memory.articles().await.is_empty());
        assert_eq!(memory.image_count().await, 0);
    }

    #[tokio::test]
    async fn test_generation_failure_skips_item() {
        let memory = MemoryStorage::new();
        let model = writer_model(
            || Err(Error::Inference("completion response contained no choices".to_string())),
            || Ok("unused".to_string()),
        );
        let report = pipeline(vec![album_item()], &memory, model.clone(), jpeg_fetcher())
            .run()
            .await
            .unwrap();

        assert_eq!(kinds(&report), vec![LogKind::SkippedGenerationFailed]);
        assert!(memory.articles().await.is_empty());
        // the headline is never rewritten for a skipped body
        assert_eq!(model.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_low_quality_content_is_rejected() {
        let memory = MemoryStorage::new();
        let model = writer_model(
            || Ok("I'm sorry, but I cannot access external links.".to_string()),
            || Ok("unused".to_string()),
        );
        let report = pipeline(vec![album_item()], &memory, model, jpeg_fetcher()).run().await.unwrap();

        assert_eq!(kinds(&report), vec![LogKind::SkippedLowQuality]);
        assert!(report.logs[0].message.contains("I'm sorry"));
        assert!(memory.articles().await.is_empty());
    }

    #[tokio::test]
    async fn test_headline_rewrite_falls_back_to_original() {
        // None stands in for a failed rewrite call
        for title in [None, Some("  ")] {
            let memory = MemoryStorage::new();
            let item = NewsItem::new(
                "\"Taylor Swift announces new album\"",
                ALBUM_URL,
                Some(ALBUM_IMAGE.to_string()),
            );
            let model = writer_model(
                || Ok("Taylor Swift has a new album on the way.".to_string()),
                move || {
                    title
                        .map(str::to_string)
                        .ok_or_else(|| Error::Inference("timeout".to_string()))
                },
            );
            let report = pipeline(vec![item], &memory, model, jpeg_fetcher()).run().await.unwrap();

            assert_eq!(kinds(&report), vec![LogKind::Inserted]);
            assert_eq!(memory.articles().await[0].title, "Taylor Swift announces new album");
        }
    }

    #[tokio::test]
    async fn test_news_search_failure_aborts_run() {
        let memory = MemoryStorage::new();
        let pipeline = IngestPipeline::new(
            Arc::new(StaticNewsSource::failing("GNews API fetch failed: 403 Forbidden")),
            Storage::from_backend(memory.clone()),
            healthy_model(),
            IngestConfig::default(),
        );

        let aborted = pipeline.run().await.unwrap_err();
        assert_eq!(aborted.to_string(), "News source error: GNews API fetch failed: 403 Forbidden");
        assert!(aborted.logs.is_empty());
    }

    #[tokio::test]
    async fn test_missing_credentials_abort_and_keep_logs() {
        let memory = MemoryStorage::new();
        let items = vec![
            NewsItem::new("Unrelated", "https://news.example.com/x", None),
            album_item(),
            NewsItem::new("Taylor Swift again", "https://news.example.com/y", Some(ALBUM_IMAGE.to_string())),
        ];
        let model = writer_model(
            || Err(Error::Config("OpenAI API key is missing".to_string())),
            || Ok("unused".to_string()),
        );

        let aborted = pipeline(items, &memory, model, jpeg_fetcher()).run().await.unwrap_err();
        assert!(aborted.error.is_config());
        assert_eq!(
            aborted.logs.iter().map(|e| e.kind).collect::<Vec<_>>(),
            vec![LogKind::SkippedIrrelevant, LogKind::Failed]
        );
        assert!(memory.articles().await.is_empty());
    }

    #[tokio::test]
    async fn test_one_bad_item_does_not_stop_the_run() {
        let memory = MemoryStorage::new();
        let items = vec![
            NewsItem::new("Taylor Swift broken image", "https://news.example.com/broken", Some("https://img.example.com/missing.jpg".to_string())),
            album_item(),
        ];
        let report = pipeline(items, &memory, healthy_model(), jpeg_fetcher()).run().await.unwrap();

        assert_eq!(kinds(&report), vec![LogKind::SkippedNoImage, LogKind::Inserted]);
        assert_eq!(report.inserted.len(), 1);
        assert_eq!(report.inserted[0].source_url, ALBUM_URL);
    }

    #[tokio::test]
    async fn test_oversized_dedup_window_covers_all_rows() {
        let memory = MemoryStorage::new();
        memory
            .store_article(&NewArticle {
                title: "Years ago".to_string(),
                ai_content: "Ancient news.".to_string(),
                image_path: None,
                source_url: ALBUM_URL.to_string(),
                created_at: Utc::now() - Duration::days(3650),
            })
            .await
            .unwrap();

        let config = IngestConfig {
            dedup_window: Duration::days(100_000_000),
            ..IngestConfig::default()
        };
        assert_eq!(config.dedup_cutoff(Utc::now()), DateTime::<Utc>::MIN_UTC);

        let pipeline = IngestPipeline::new(
            Arc::new(StaticNewsSource::new(vec![album_item()])),
            Storage::from_backend(memory.clone()),
            healthy_model(),
            config,
        )
        .with_image_fetcher(Arc::new(jpeg_fetcher()));

        let report = pipeline.run().await.unwrap();
        assert_eq!(kinds(&report), vec![LogKind::SkippedDuplicate]);
    }

    #[test]
    fn test_dedup_cutoff() {
        let now = Utc::now();
        let config = IngestConfig::default();
        assert_eq!(config.dedup_cutoff(now), now - Duration::hours(24));
    }

    const TOUR_URL: &str = "https://news.example.com/taylor-swift-tour";
    const TOUR_IMAGE: &str = "https://img.example.com/tour.png";
    const TOUR_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47];

    #[derive(Clone, Copy, Debug)]
    enum FailAt {
        Lookup,
        Upload,
        Insert,
    }

    /// Memory backend whose storage calls for the tour item fail at one step.
    struct FaultyStorage {
        inner: MemoryStorage,
        fail_at: FailAt,
    }

    fn outage() -> Error {
        Error::Storage("connection reset by peer".to_string())
    }

    #[async_trait]
    impl ArticleStorage for FaultyStorage {
        async fn store_article(&self, article: &NewArticle) -> Result<Article> {
            if matches!(self.fail_at, FailAt::Insert) && article.source_url == TOUR_URL {
                return Err(outage());
            }
            self.inner.store_article(article).await
        }

        async fn find_recent_by_source_url(
            &self,
            source_url: &str,
            since: DateTime<Utc>,
        ) -> Result<Option<Article>> {
            if matches!(self.fail_at, FailAt::Lookup) && source_url == TOUR_URL {
                return Err(outage());
            }
            self.inner.find_recent_by_source_url(source_url, since).await
        }

        async fn list_articles(&self, page: Page) -> Result<Vec<Article>> {
            self.inner.list_articles(page).await
        }
    }

    #[async_trait]
    impl ImageStorage for FaultyStorage {
        async fn upload_image(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String> {
            if matches!(self.fail_at, FailAt::Upload) && bytes == TOUR_BYTES {
                return Err(outage());
            }
            self.inner.upload_image(key, bytes, content_type).await
        }

        fn image_url(&self, key: &str) -> String {
            self.inner.image_url(key)
        }
    }

    #[tokio::test]
    async fn test_storage_failure_skips_only_that_item() {
        for fail_at in [FailAt::Lookup, FailAt::Upload, FailAt::Insert] {
            let memory = MemoryStorage::new();
            let faulty = Arc::new(FaultyStorage {
                inner: memory.clone(),
                fail_at,
            });
            let storage = Storage {
                articles: faulty.clone(),
                images: faulty,
            };
            let items = vec![
                NewsItem::new("Taylor Swift tour photos", TOUR_URL, Some(TOUR_IMAGE.to_string())),
                album_item(),
            ];
            let fetcher = jpeg_fetcher().with(TOUR_IMAGE, "image/png", TOUR_BYTES);
            let pipeline = IngestPipeline::new(
                Arc::new(StaticNewsSource::new(items)),
                storage,
                healthy_model(),
                IngestConfig::default(),
            )
            .with_image_fetcher(Arc::new(fetcher));

            let report = pipeline.run().await.unwrap();
            assert_eq!(kinds(&report), vec![LogKind::Failed, LogKind::Inserted], "{:?}", fail_at);
            assert!(report.logs[0].message.contains("connection reset by peer"));

            let rows = memory.articles().await;
            assert_eq!(rows.len(), 1, "{:?}", fail_at);
            assert_eq!(rows[0].source_url, ALBUM_URL);
            assert!(rows.iter().all(|row| row.source_url != TOUR_URL));
        }
    }

    #[test]
    fn test_fallback_title() {
        assert_eq!(fallback_title("  'Taylor Swift wins'  "), "Taylor Swift wins");
        assert_eq!(fallback_title("Taylor Swift wins"), "Taylor Swift wins");
    }
}
