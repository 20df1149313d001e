use crate::{config::IntakeConfig, error::AppError, error::FetchFailure};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::Url;
use tracing::debug;

/// Downloads the raw bytes behind an image URL.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Bytes, FetchFailure>;
}

/// [`ImageFetcher`] backed by a shared `reqwest` client with a bounded
/// timeout and a cap on the response size.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpImageFetcher {
    pub fn new(config: &IntakeConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.fetch_timeout())
            .connect_timeout(config.fetch_timeout())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(AppError::HttpClient)?;

        Ok(Self {
            client,
            max_bytes: config.max_payload_bytes,
        })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &Url) -> Result<Bytes, FetchFailure> {
        debug!("Fetching image from {}", url);
        let mut response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes as u64 {
                return Err(FetchFailure::TooLarge {
                    limit: self.max_bytes,
                });
            }
        }

        // Content-Length may be absent or wrong, so the cap is enforced while reading.
        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(FetchFailure::TooLarge {
                    limit: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body.freeze())
    }
}
