use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sh_core::{Article, Page};
use sh_ingest::IngestReport;
use std::sync::Arc;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ArticleView {
    #[serde(flatten)]
    pub article: Article,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ArticleList {
    pub articles: Vec<ArticleView>,
    pub page: u32,
    pub page_size: u32,
    pub has_more: bool,
}

pub async fn fetch_news(State(state): State<Arc<AppState>>) -> ApiResult<Json<IngestReport>> {
    let report = state.pipeline.run().await?;
    Ok(Json(report))
}

pub async fn chat(State(state): State<Arc<AppState>>, body: Bytes) -> ApiResult<Json<ChatReply>> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ChatRequest::default()
    } else {
        serde_json::from_slice::<ChatRequest>(&body)
            .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e)))?
    };

    let message = request
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Message is required"))?;

    let reply = state.chat.reply(&message).await?;
    Ok(Json(ChatReply { reply }))
}

pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ArticleList>> {
    let page = Page::new(
        params.page.unwrap_or(1),
        params.page_size.unwrap_or(Page::DEFAULT_SIZE).min(MAX_PAGE_SIZE),
    );
    let articles = state.articles.list_articles(page).await?;
    let has_more = articles.len() as u32 >= page.size;

    let articles = articles
        .into_iter()
        .map(|article| {
            let image_url = article.image_path.as_deref().map(|key| state.images.image_url(key));
            ArticleView { article, image_url }
        })
        .collect();

    Ok(Json(ArticleList {
        articles,
        page: page.number,
        page_size: page.size,
        has_more,
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
