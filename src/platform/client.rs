//! HTTP client for the search and delivery APIs and for object storage

use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{HttpConfig, PlatformConfig};
use crate::error::{QuickstartError, Result};
use crate::platform::delivery::{DeliveryResponse, FileRequest};
use crate::platform::search::{FilesByResourceType, SearchRequest, SearchResponse};

/// Client for the platform APIs.
///
/// Cheap to clone; all clones share the same connection pools.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    api: reqwest::Client,
    download: reqwest::Client,
    config: Arc<PlatformConfig>,
}

/// Response of a storage GET whose body has not been read yet.
#[derive(Debug)]
pub struct ObjectStream {
    /// `Content-Type` reported by storage
    pub content_type: Option<String>,
    /// `Content-Length` reported by storage
    pub content_length: Option<u64>,
    response: reqwest::Response,
}

impl PlatformClient {
    /// Creates a client from already built HTTP clients.
    pub fn new(api: reqwest::Client, download: reqwest::Client, config: PlatformConfig) -> Self {
        Self {
            api,
            download,
            config: Arc::new(config),
        }
    }

    /// Creates a client with the timeouts from `http`.
    ///
    /// # Errors
    ///
    /// Returns error if either HTTP client cannot be built
    pub fn from_config(config: PlatformConfig, http: &HttpConfig) -> Result<Self> {
        Ok(Self::new(http.api_client()?, http.download_client()?, config))
    }

    /// Platform settings this client was built with
    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Runs a full-text search for `term` and groups the hits by resource type.
    ///
    /// # Errors
    ///
    /// Returns [`QuickstartError::Upstream`], [`QuickstartError::UpstreamTimeout`],
    /// [`QuickstartError::UpstreamStatus`] or [`QuickstartError::MalformedResponse`].
    pub async fn search(&self, term: &str) -> Result<FilesByResourceType> {
        let request = SearchRequest::new(term, &self.config);
        let response: SearchResponse = self
            .post_json("search", &self.config.search_url(), &request)
            .await?;
        Ok(response.files_by_resource_type())
    }

    /// Asks the delivery API where the file for `srn` can be downloaded.
    ///
    /// # Errors
    ///
    /// Returns [`QuickstartError::MalformedResponse`] if the response carries
    /// no usable file location, or any of the transport and status errors of
    /// [`PlatformClient::search`].
    pub async fn resolve_download_url(&self, srn: &str) -> Result<String> {
        let request = FileRequest::single(srn, self.config.target_region.clone());
        let response: DeliveryResponse = self
            .post_json("delivery", &self.config.delivery_url(), &request)
            .await?;

        if let Some(unprocessed) = response.unprocessed_srns.as_deref() {
            if !unprocessed.is_empty() {
                tracing::warn!(?unprocessed, "Delivery API left SRNs unprocessed");
            }
        }

        let location = response
            .first_location()
            .ok_or_else(|| QuickstartError::MalformedResponse {
                service: "delivery",
                message: "delivery response missing file location".to_string(),
            })?;

        location.download_url()
    }

    /// Starts an anonymous GET for a pre-signed storage URL.
    ///
    /// # Errors
    ///
    /// Returns a transport error, or [`QuickstartError::UpstreamStatus`] if
    /// storage answers with a non-success status.
    pub async fn open_object(&self, url: &str) -> Result<ObjectStream> {
        let response = self
            .download
            .get(url)
            .send()
            .await
            .map_err(|e| QuickstartError::transport("storage", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QuickstartError::UpstreamStatus {
                service: "storage",
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content_length = response.content_length();

        Ok(ObjectStream {
            content_type,
            content_length,
            response,
        })
    }

    async fn post_json<B, R>(&self, service: &'static str, url: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        if tracing::enabled!(tracing::Level::DEBUG) {
            let payload = serde_json::to_string(body)?;
            tracing::debug!(service, url, %payload, "Sending request");
        }

        let response = self
            .api
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| QuickstartError::transport(service, e))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| QuickstartError::transport(service, e))?;

        if !status.is_success() {
            return Err(QuickstartError::UpstreamStatus {
                service,
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            }
            .into());
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            QuickstartError::MalformedResponse {
                service,
                message: e.to_string(),
            }
            .into()
        })
    }
}

impl ObjectStream {
    /// Consumes the response as a stream of chunks.
    ///
    /// Each chunk logs the running byte count at debug level. A chunk error
    /// is logged once and passed through, which aborts the body downstream.
    pub fn into_byte_stream(self) -> impl Stream<Item = reqwest::Result<Bytes>> + Send + 'static {
        let total = self.content_length;
        let mut received: u64 = 0;

        self.response.bytes_stream().map(move |chunk| {
            match &chunk {
                Ok(bytes) => {
                    received += bytes.len() as u64;
                    match total {
                        Some(total) => tracing::debug!(received, total, "Download progress"),
                        None => tracing::debug!(received, "Download progress"),
                    }
                }
                Err(e) => tracing::warn!(received, error = %e, "Download aborted"),
            }
            chunk
        })
    }
}
