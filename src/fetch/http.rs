use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use super::FragmentFetcher;
use crate::error::RetrievalError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpFetchConfig {
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout_secs: u64,
    pub tcp_keepalive_secs: Option<u64>,
    pub http2_enabled: bool,
    pub user_agent: String,
}

impl Default for HttpFetchConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: 10,
            pool_idle_timeout_secs: 90,
            tcp_keepalive_secs: Some(60),
            http2_enabled: true,
            user_agent: concat!("xinclude/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Fetches sources over HTTP(S), resolving relative ones against a base URL.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base: Url,
}

impl HttpFetcher {
    pub fn new(base: Url, config: &HttpFetchConfig) -> Result<Self, RetrievalError> {
        let client = Self::apply_pool_options(reqwest::Client::builder(), config)
            .build()
            .map_err(|e| RetrievalError::Transport {
                source_url: base.to_string(),
                message: format!("failed to create HTTP client: {}", e),
            })?;
        Ok(Self { client, base })
    }

    fn apply_pool_options(
        mut builder: reqwest::ClientBuilder,
        config: &HttpFetchConfig,
    ) -> reqwest::ClientBuilder {
        builder = builder
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .tcp_keepalive(config.tcp_keepalive_secs.map(Duration::from_secs))
            .user_agent(config.user_agent.clone());

        if !config.http2_enabled {
            builder = builder.http1_only();
        }

        builder
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve `source` the way a browser resolves an attribute URL.
    pub fn resolve(&self, source: &str) -> Result<Url, RetrievalError> {
        self.base
            .join(source.trim())
            .map_err(|e| RetrievalError::InvalidSource {
                source_url: source.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl FragmentFetcher for HttpFetcher {
    async fn fetch(&self, source: &str) -> Result<String, RetrievalError> {
        let url = self.resolve(source)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RetrievalError::Transport {
                source_url: source.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::Status {
                source_url: source.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| RetrievalError::Transport {
            source_url: source.to_string(),
            message: format!("failed to read response body: {}", e),
        })
    }

    fn describe(&self) -> String {
        format!("http({})", self.base)
    }
}
