use async_trait::async_trait;
use quire_api_types::{CSR_MARKER, CSR_MARKER_VALUE, PageData};
use reqwest::Client;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {0}")]
    Status(u16),
    #[error("undecodable page data: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Source of page data for URLs missing from the cache.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<PageData, FetchError>;
}

/// Fetches page data from a quire server over HTTP.
#[derive(Clone, Debug)]
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder().user_agent(Self::user_agent()).build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub fn user_agent() -> &'static str {
        concat!("quire-navigator/", env!("CARGO_PKG_VERSION"))
    }

    /// Fetch the full HTML document at `url`, without the data marker.
    pub async fn fetch_document(&self, url: &Url) -> Result<String, FetchError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &Url) -> Result<PageData, FetchError> {
        let response = self.client.get(data_url(url)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// `url` with the data marker appended to its existing query.
pub fn data_url(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url.query_pairs_mut().append_pair(CSR_MARKER, CSR_MARKER_VALUE);
    url
}
