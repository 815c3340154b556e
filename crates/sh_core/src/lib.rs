pub mod models;
pub mod error;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use models::InferenceModel;
pub use storage::{ArticleStorage, ImageStorage};
pub use types::{Article, CompletionRequest, NewArticle, NewsItem, Page};
