//! Calls to the processing and image-generation backend.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::constants::{CACHE_BUST_PARAM, GENERATE_IMAGE_ENDPOINT, PROCESS_ENDPOINT};
use crate::envelope::{Envelope, ImageRequest, ImageResult, ProcessRequest, ProcessingResult};
use crate::error::PipelineError;

/// The remote collaborators a generation run talks to.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Collects profile data for `handle` and returns a generated prompt.
    async fn process(&self, handle: &str) -> Result<ProcessingResult, PipelineError>;

    /// Asks the image generator to draw `prompt`.
    async fn generate_image(&self, prompt: &str) -> Result<ImageResult, PipelineError>;

    /// Downloads the raw bytes of a generated image.
    async fn fetch_image(&self, image_url: &str) -> Result<Vec<u8>, PipelineError>;

    /// A link to the generated image suitable for sharing.
    fn public_image_link(&self, image_url: &str) -> String {
        image_url.to_owned()
    }
}

/// [`GenerationBackend`] speaking JSON over HTTP.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    /// Creates a backend rooted at `base_url`.
    pub fn new(base_url: Url) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Creates a backend using an existing client.
    pub fn with_client(client: reqwest::Client, mut base_url: Url) -> Self {
        // joins are relative, so the base has to look like a directory
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { client, base_url }
    }

    /// The normalised base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, PipelineError> {
        self.base_url
            .join(path)
            .map_err(|err| PipelineError::NetworkFailure(format!("Bad endpoint {path}: {err}")))
    }

    /// Resolves an image URL, which the backend may hand back relative to itself.
    pub fn resolve_image_url(&self, image_url: &str) -> Result<Url, PipelineError> {
        self.base_url.join(image_url).map_err(|err| {
            PipelineError::ImageLoadFailure(format!("Bad image URL {image_url}: {err}"))
        })
    }

    async fn post_envelope<T, B>(&self, path: &str, body: &B) -> Result<T, PipelineError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync,
    {
        let url = self.endpoint(path)?;
        debug!("POST {url}");
        let resp = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|err| PipelineError::NetworkFailure(format!("Request to {url} failed: {err}")))?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|err| {
            PipelineError::NetworkFailure(format!("Failed reading {url} body: {err}"))
        })?;
        if !status.is_success() {
            return Err(PipelineError::NetworkFailure(format!(
                "{url} returned {status}: {}",
                String::from_utf8_lossy(&bytes)
            )));
        }

        Envelope::<T>::decode(&bytes)?.into_result()
    }
}

/// Appends the cache-busting timestamp to an image URL.
pub fn cache_busted(mut url: Url, timestamp_millis: i64) -> Url {
    url.query_pairs_mut()
        .append_pair(CACHE_BUST_PARAM, &timestamp_millis.to_string());
    url
}

#[async_trait]
impl GenerationBackend for HttpBackend {
    async fn process(&self, handle: &str) -> Result<ProcessingResult, PipelineError> {
        self.post_envelope(PROCESS_ENDPOINT, &ProcessRequest { message: handle })
            .await
    }

    async fn generate_image(&self, prompt: &str) -> Result<ImageResult, PipelineError> {
        self.post_envelope(GENERATE_IMAGE_ENDPOINT, &ImageRequest { prompt })
            .await
    }

    async fn fetch_image(&self, image_url: &str) -> Result<Vec<u8>, PipelineError> {
        let url = cache_busted(
            self.resolve_image_url(image_url)?,
            Utc::now().timestamp_millis(),
        );
        debug!("GET {url}");
        let resp = self.client.get(url.clone()).send().await.map_err(|err| {
            PipelineError::ImageLoadFailure(format!("Request to {url} failed: {err}"))
        })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PipelineError::ImageLoadFailure(format!(
                "{url} returned {status}"
            )));
        }
        let bytes = resp.bytes().await.map_err(|err| {
            PipelineError::ImageLoadFailure(format!("Failed reading {url} body: {err}"))
        })?;
        Ok(bytes.to_vec())
    }

    fn public_image_link(&self, image_url: &str) -> String {
        self.resolve_image_url(image_url)
            .map(String::from)
            .unwrap_or_else(|_| image_url.to_owned())
    }
}
