use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::repository::{Storage, StorageError};

mod course_repo;
mod mapping;
mod progress_repo;
mod quiz_repo;
mod search_repo;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const API_PREFIX: [&str; 2] = ["api", "v1"];

/// Where the content/progress backend lives and how long to wait for it.
#[derive(Clone, Debug)]
pub struct HttpConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HttpInitError {
    #[error("invalid backend url {raw}: {source}")]
    InvalidBaseUrl {
        raw: String,
        #[source]
        source: url::ParseError,
    },
    #[error("backend url cannot carry a path: {0}")]
    NotABase(String),
    #[error("invalid timeout seconds: {0}")]
    InvalidTimeout(String),
    #[error(transparent)]
    Client(#[from] reqwest::Error),
}

impl HttpConfig {
    /// # Errors
    ///
    /// Returns `HttpInitError` if `base_url` does not parse or cannot have path segments.
    pub fn new(base_url: &str) -> Result<Self, HttpInitError> {
        let parsed = Url::parse(base_url.trim()).map_err(|source| HttpInitError::InvalidBaseUrl {
            raw: base_url.to_string(),
            source,
        })?;
        if parsed.cannot_be_a_base() {
            return Err(HttpInitError::NotABase(base_url.to_string()));
        }
        Ok(Self {
            base_url: parsed,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read `COMPANION_API_URL` and `COMPANION_TIMEOUT_SECS`, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `HttpInitError` if either variable is set to an invalid value.
    pub fn from_env() -> Result<Self, HttpInitError> {
        let base_url =
            std::env::var("COMPANION_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let mut config = Self::new(&base_url)?;
        if let Ok(raw) = std::env::var("COMPANION_TIMEOUT_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| HttpInitError::InvalidTimeout(raw.clone()))?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Repository backed by the course companion HTTP API.
#[derive(Clone)]
pub struct HttpRepository {
    client: Client,
    base_url: Url,
}

fn transport(e: reqwest::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

impl HttpRepository {
    /// # Errors
    ///
    /// Returns `HttpInitError::Client` if the HTTP client cannot be built.
    pub fn connect(config: &HttpConfig) -> Result<Self, HttpInitError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/api/v1/{segments...}`, each segment percent-encoded.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, StorageError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StorageError::Connection(format!("not a base url: {}", self.base_url)))?
            .pop_if_empty()
            .extend(API_PREFIX)
            .extend(segments);
        Ok(url)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, StorageError> {
        tracing::debug!(%url, "GET");
        let response = self.client.get(url.clone()).send().await.map_err(transport)?;
        Self::decode(&url, response).await
    }

    pub(crate) async fn post_json<B, T>(&self, url: Url, body: Option<&B>) -> Result<T, StorageError>
    where
        B: serde::Serialize + Sync,
        T: DeserializeOwned,
    {
        tracing::debug!(%url, "POST");
        let mut request = self.client.post(url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(transport)?;
        Self::decode(&url, response).await
    }

    pub(crate) async fn put_empty(&self, url: Url) -> Result<(), StorageError> {
        tracing::debug!(%url, "PUT");
        let response = self.client.put(url.clone()).send().await.map_err(transport)?;
        Self::check_status(&url, response.status())
    }

    fn check_status(url: &Url, status: StatusCode) -> Result<(), StorageError> {
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(%url, "backend reported not found");
            return Err(StorageError::NotFound);
        }
        if status == StatusCode::CONFLICT {
            return Err(StorageError::Conflict);
        }
        if !status.is_success() {
            tracing::warn!(%url, %status, "backend request failed");
            return Err(StorageError::Status(status.as_u16()));
        }
        Ok(())
    }

    async fn decode<T: DeserializeOwned>(url: &Url, response: Response) -> Result<T, StorageError> {
        Self::check_status(url, response.status())?;
        response.json::<T>().await.map_err(|e| {
            tracing::warn!(%url, error = %e, "undecodable backend response");
            StorageError::Serialization(e.to_string())
        })
    }
}

impl Storage {
    /// Build a `Storage` backed by the HTTP API.
    ///
    /// # Errors
    ///
    /// Returns `HttpInitError` if the HTTP client cannot be built.
    pub fn http(config: &HttpConfig) -> Result<Self, HttpInitError> {
        let repo = HttpRepository::connect(config)?;
        Ok(Self::from_repository(repo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpRepository>();
    }

    #[test]
    fn endpoint_appends_api_prefix_and_encodes() {
        let config = HttpConfig::new("http://example.test/backend/").unwrap();
        let repo = HttpRepository::connect(&config).unwrap();
        let url = repo.endpoint(&["courses", "a b", "chapters"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://example.test/backend/api/v1/courses/a%20b/chapters"
        );
    }

    #[test]
    fn endpoint_keeps_trailing_slash_segment() {
        let repo = HttpRepository::connect(&HttpConfig::default()).unwrap();
        let url = repo.endpoint(&["courses", ""]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/v1/courses/");
    }

    #[test]
    fn config_rejects_non_base_urls() {
        assert!(matches!(
            HttpConfig::new("mailto:someone@example.test"),
            Err(HttpInitError::NotABase(_))
        ));
        assert!(matches!(
            HttpConfig::new("not a url"),
            Err(HttpInitError::InvalidBaseUrl { .. })
        ));
    }
}
