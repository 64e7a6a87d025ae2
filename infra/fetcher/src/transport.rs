use crate::error::FetchError;
use portal_domain::config::FetchConfig;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Raw body retrieval. Implementations report failures as [`FetchError::Transport`].
pub trait Transport: Send + Sync + 'static {
    fn get(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn get(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send {
        self.as_ref().get(url)
    }
}

/// `reqwest`-backed transport. `file://` URLs and bare paths are read from disk,
/// which lets the base settings document ship next to the binary.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// # Errors
    /// Returns [`FetchError::Transport`] if the HTTP client cannot be constructed.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::transport(e.to_string()).context("Failed to build HTTP client"))?;
        Ok(Self { client })
    }

    async fn read_local(path: &Path) -> Result<String, FetchError> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| FetchError::transport(e.to_string()).context(path.display().to_string()))
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        if let Some(path) = local_path(url) {
            trace!(path = %path.display(), "Reading local document");
            return Self::read_local(path).await;
        }

        trace!(url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::transport(e.to_string()).context(url.to_owned()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::transport(format!("unexpected status {status}"))
                .context(url.to_owned()));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::transport(e.to_string()).context(url.to_owned()))
    }
}

fn local_path(url: &str) -> Option<&Path> {
    if let Some(path) = url.strip_prefix("file://") {
        return Some(Path::new(path));
    }
    if url.contains("://") { None } else { Some(Path::new(url)) }
}
