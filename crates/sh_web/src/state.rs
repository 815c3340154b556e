use std::sync::Arc;
use sh_core::{ArticleStorage, ImageStorage};
use sh_inference::ChatResponder;
use sh_ingest::IngestPipeline;
use sh_storage::Storage;

pub struct AppState {
    pub pipeline: Arc<IngestPipeline>,
    pub chat: Arc<ChatResponder>,
    pub articles: Arc<dyn ArticleStorage>,
    pub images: Arc<dyn ImageStorage>,
}

impl AppState {
    pub fn new(pipeline: IngestPipeline, chat: ChatResponder, storage: Storage) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            chat: Arc::new(chat),
            articles: storage.articles,
            images: storage.images,
        }
    }
}
