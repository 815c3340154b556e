use serde::{Deserialize, Serialize};
use sh_core::{Article, Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    SkippedIrrelevant,
    SkippedDuplicate,
    SkippedNoImage,
    SkippedGenerationFailed,
    SkippedLowQuality,
    Failed,
    Inserted,
}

/// One per-item decision of an ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub kind: LogKind,
    pub message: String,
}

impl LogEntry {
    pub fn new(kind: LogKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn irrelevant(headline: &str) -> Self {
        Self::new(LogKind::SkippedIrrelevant, format!("Skipping unrelated article: {}", headline))
    }

    pub fn duplicate(headline: &str, existing: &Article) -> Self {
        Self::new(
            LogKind::SkippedDuplicate,
            format!(
                "Skipping duplicate article: {} (stored {})",
                headline,
                existing.created_at.to_rfc3339()
            ),
        )
    }

    pub fn no_image(headline: &str, reason: &str) -> Self {
        Self::new(
            LogKind::SkippedNoImage,
            format!("Skipping article without a usable image: {} ({})", headline, reason),
        )
    }

    pub fn generation_failed(headline: &str, error: &Error) -> Self {
        Self::new(
            LogKind::SkippedGenerationFailed,
            format!("Skipping article, content generation failed: {} ({})", headline, error),
        )
    }

    pub fn low_quality(headline: &str, phrase: &str) -> Self {
        Self::new(
            LogKind::SkippedLowQuality,
            format!("Skipping low-quality content for: {} (contains \"{}\")", headline, phrase),
        )
    }

    pub fn failed(headline: &str, error: &Error) -> Self {
        Self::new(LogKind::Failed, format!("Failed to process article: {} ({})", headline, error))
    }

    pub fn inserted(article: &Article) -> Self {
        Self::new(LogKind::Inserted, format!("Article inserted successfully: {}", article.title))
    }
}

/// Outcome of a completed run, however many items were skipped.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub message: String,
    pub logs: Vec<LogEntry>,
    #[serde(skip)]
    pub inserted: Vec<Article>,
}

impl IngestReport {
    pub fn count(&self, kind: LogKind) -> usize {
        self.logs.iter().filter(|entry| entry.kind == kind).count()
    }
}

/// A run that stopped early. Carries the entries logged before the failure.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct IngestAborted {
    pub error: Error,
    pub logs: Vec<LogEntry>,
}
