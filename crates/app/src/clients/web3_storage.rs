use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;
use url::Url;

use common::store::{parse_cid, Cid, ContentStore, StoreError};

use super::error::ClientError;
use crate::state::ClientConfig;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    cid: String,
}

/// Pinning-service upload API plus its read gateway.
///
/// Uploads go out as a one-file multipart form, so the service wraps each
/// blob in a directory and the returned CID serves it at `{cid}/<name>`.
/// The gateway template's path must name the same file.
#[derive(Debug, Clone)]
pub struct Web3Storage {
    api_url: Url,
    gateway_url: String,
    token: Option<String>,
    client: Client,
}

impl Web3Storage {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            api_url: config.storage_api_url.clone(),
            gateway_url: config.gateway_url.clone(),
            token: config.storage_token.clone(),
            client: Client::builder().build()?,
        })
    }

    pub fn upload_url(&self) -> Result<Url, ClientError> {
        Ok(self.api_url.join("upload")?)
    }

    /// Gateway URL for a content identifier
    pub fn gateway_url(&self, cid: &Cid) -> Result<Url, ClientError> {
        Ok(Url::parse(
            &self.gateway_url.replace("{cid}", &cid.to_string()),
        )?)
    }

    async fn upload(&self, name: &str, data: Bytes) -> Result<Cid, StoreError> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| StoreError::Upload("no storage token configured".to_string()))?;
        let part = multipart::Part::bytes(data.to_vec())
            .file_name(name.to_string())
            .mime_str("application/octet-stream")
            .map_err(ClientError::from)?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.upload_url()?)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(ClientError::from)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::HttpStatus(status, body).into());
        }

        let body: UploadResponse = response.json().await.map_err(ClientError::from)?;
        parse_cid(&body.cid)
    }

    async fn download(&self, cid: &Cid) -> Result<Bytes, StoreError> {
        let fetch_error = |reason: String| StoreError::Fetch {
            cid: cid.to_string(),
            reason,
        };

        let url = self.gateway_url(cid).map_err(|e| fetch_error(e.to_string()))?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        match response.status() {
            status if status.is_success() => response
                .bytes()
                .await
                .map_err(|e| fetch_error(e.to_string())),
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(cid.to_string())),
            status => Err(fetch_error(format!("HTTP status {}", status))),
        }
    }
}

#[async_trait]
impl ContentStore for Web3Storage {
    async fn put(&self, name: &str, data: Bytes) -> Result<Cid, StoreError> {
        tracing::debug!(name, bytes = data.len(), "uploading blob");
        self.upload(name, data).await
    }

    async fn get(&self, cid: &Cid) -> Result<Bytes, StoreError> {
        tracing::debug!(%cid, "fetching blob");
        self.download(cid).await
    }
}
