pub mod sources;
pub mod images;
pub mod quality;
pub mod report;
pub mod pipeline;
pub mod logging;

pub use logging::{init_logging, Logger};
pub use pipeline::{IngestConfig, IngestPipeline};
pub use report::{IngestAborted, IngestReport, LogEntry, LogKind};
pub use sources::{NewsQuery, NewsSource};

pub mod prelude {
    pub use super::sources::{NewsQuery, NewsSource};
    pub use super::pipeline::{IngestConfig, IngestPipeline};
    pub use super::report::{IngestAborted, IngestReport, LogEntry, LogKind};
    pub use sh_core::{Article, Error, NewsItem, Result};
}
