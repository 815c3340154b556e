use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::Client;
use sh_core::{Error, Result};
use url::Url;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedImage>;
}

/// Largest image body accepted by [`HttpImageFetcher`].
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: Client,
    max_bytes: usize,
}

impl Default for HttpImageFetcher {
    fn default() -> Self {
        Self {
            client: Client::new(),
            max_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

impl HttpImageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    fn too_large(&self, url: &Url) -> Error {
        Error::External(anyhow!("image {} is larger than {} bytes", url, self.max_bytes))
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedImage> {
        let mut response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::External(anyhow!("image fetch {} returned {}", url, status)));
        }
        if response.content_length().is_some_and(|len| len > self.max_bytes as u64) {
            return Err(self.too_large(url));
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // Content-Length may be absent or wrong, so the cap also applies while reading.
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(self.too_large(url));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(FetchedImage { bytes, content_type })
    }
}

/// Parse an image URL, accepting only http and https.
pub fn parse_image_url(raw: Option<&str>) -> Option<Url> {
    let url = Url::parse(raw?.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// The bare `image/*` MIME type of a Content-Type header, if it is one.
pub fn image_mime(content_type: Option<&str>) -> Option<String> {
    let mime = content_type?.split(';').next()?.trim().to_ascii_lowercase();
    (mime.starts_with("image/") && mime.len() > "image/".len()).then_some(mime)
}

pub fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/avif" => "avif",
        _ => "jpg",
    }
}

/// Fresh blob key under `prefix`. Keys never carry a scheme or host so
/// readers can join them onto any public storage base URL.
pub fn new_image_key(prefix: &str, mime: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{}.{}", Uuid::new_v4(), extension_for(mime))
    } else {
        format!("{}/{}.{}", prefix, Uuid::new_v4(), extension_for(mime))
    }
}
