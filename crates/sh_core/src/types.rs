use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A story as returned by the news search API. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub headline: String,
    pub source_url: String,
    pub image_url: Option<String>,
}

impl NewsItem {
    pub fn new(headline: impl Into<String>, source_url: impl Into<String>, image_url: Option<String>) -> Self {
        Self {
            headline: headline.into(),
            source_url: source_url.into(),
            image_url,
        }
    }
}

/// A persisted article row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub ai_content: String,
    /// Blob store key, never a full URL.
    pub image_path: Option<String>,
    pub source_url: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for the row store; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub ai_content: String,
    pub image_path: Option<String>,
    pub source_url: String,
    pub created_at: DateTime<Utc>,
}

impl NewArticle {
    pub fn into_article(self, id: Uuid) -> Article {
        Article {
            id,
            title: self.title,
            ai_content: self.ai_content,
            image_path: self.image_path,
            source_url: self.source_url,
            created_at: self.created_at,
        }
    }
}

/// A single role-structured prompt for the generative text service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_message: String,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(system_prompt: impl Into<String>, user_message: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_message: user_message.into(),
            max_tokens,
        }
    }
}

/// One-based page of the article feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    pub const DEFAULT_SIZE: u32 = 10;

    pub fn new(number: u32, size: u32) -> Self {
        Self {
            number: number.max(1),
            size: size.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.number as u64 - 1) * self.size as u64
    }

    pub fn limit(&self) -> u64 {
        self.size as u64
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_SIZE)
    }
}
