// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! HTTP client for the menu API.
//!
//! | Endpoint              | Body                                   |
//! |-----------------------|----------------------------------------|
//! | `GET /menus/{chain}`  | `{ items: MenuItemPayload[], lastModified }` |
//! | `GET /menus`          | same                                   |
//! | `GET /chains`         | `{ chains: ChainInfo[] }`              |
//!
//! Menu requests are conditional: a stored ETag is sent as `If-None-Match`
//! and a `304 Not Modified` comes back as [`FetchOutcome::NotModified`].
//! Nothing here retries or falls back; that is the sync service's job.

pub mod payload;

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ETAG, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::metrics;
pub use payload::{ChainsResponse, MenuItemPayload, MenusResponse};

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl TransportError {
    /// Short label for logs and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Request(e) if e.is_timeout() => "timeout",
            TransportError::Request(_) => "transport",
            TransportError::Status(code) if *code >= 500 => "5xx",
            TransportError::Status(_) => "4xx",
            TransportError::Decode(_) => "decode",
            TransportError::InvalidUrl(_) => "invalid_url",
        }
    }
}

/// Result of a conditional GET.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    NotModified,
    Fresh {
        body: Value,
        etag: Option<String>,
        last_modified: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    /// Every request carries `Accept: application/json`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .user_agent(concat!("menu-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `{base}/menus/{chain}`, or `{base}/menus` for every chain.
    pub fn menus_url(&self, chain: Option<&str>) -> Result<Url, TransportError> {
        match chain {
            Some(chain) => self.endpoint(&["menus", chain]),
            None => self.endpoint(&["menus"]),
        }
    }

    pub fn chains_url(&self) -> Result<Url, TransportError> {
        self.endpoint(&["chains"])
    }

    /// GET `url`, sending `If-None-Match` when an ETag is given.
    ///
    /// Any 2xx is treated as fresh data. 304 is [`FetchOutcome::NotModified`],
    /// everything else is [`TransportError::Status`].
    pub async fn get_conditional(
        &self,
        url: &Url,
        etag: Option<&str>,
    ) -> Result<FetchOutcome, TransportError> {
        let start = Instant::now();
        let mut request = self.http.get(url.clone());
        if let Some(etag) = etag {
            request = request.header(IF_NONE_MATCH, etag);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_http_request("menus", "transport", start.elapsed());
                return Err(e.into());
            }
        };

        let status = response.status();
        metrics::record_http_request("menus", status.as_str(), start.elapsed());
        debug!(url = %url, status = status.as_u16(), conditional = etag.is_some(), "menu request");

        if status == StatusCode::NOT_MODIFIED {
            return Ok(FetchOutcome::NotModified);
        }
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let header = |name: HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let etag = header(ETAG);
        let last_modified = header(LAST_MODIFIED);

        let bytes = response.bytes().await?;
        let body = serde_json::from_slice(&bytes)?;
        Ok(FetchOutcome::Fresh {
            body,
            etag,
            last_modified,
        })
    }

    /// Plain GET decoding a JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, TransportError> {
        let start = Instant::now();
        let response = match self.http.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_http_request("chains", "transport", start.elapsed());
                return Err(e.into());
            }
        };

        let status = response.status();
        metrics::record_http_request("chains", status.as_str(), start.elapsed());
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
