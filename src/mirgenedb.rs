use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use url::Url;

use crate::domain::Species;
use crate::error::MirError;

pub trait MirGeneDbClient: Send + Sync {
    fn fetch_text(&self, url: &str) -> Result<String, MirError>;
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, MirError>;
}

#[derive(Clone)]
pub struct MirGeneDbHttpClient {
    client: Client,
}

impl MirGeneDbHttpClient {
    pub fn new() -> Result<Self, MirError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("mirmerge/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| MirError::Http(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| MirError::Http(err.to_string()))?;
        Ok(Self { client })
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response, MirError> {
        let response = self.send_with_retries(|| self.client.get(url))?;
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "MirGeneDB request failed".to_string());
        Err(MirError::HttpStatus { status, message })
    }

    fn send_with_retries<F>(&self, mut make_req: F) -> Result<reqwest::blocking::Response, MirError>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            match make_req().send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        tracing::debug!(status, attempt, "retrying MirGeneDB request");
                        thread::sleep(Duration::from_millis(BASE_DELAY_MS * (attempt as u64 + 1)));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        tracing::debug!(error = %err, attempt, "retrying MirGeneDB request");
                        thread::sleep(Duration::from_millis(BASE_DELAY_MS * (attempt as u64 + 1)));
                        attempt += 1;
                        continue;
                    }
                    return Err(MirError::Http(err.to_string()));
                }
            }
        }
    }
}

impl MirGeneDbClient for MirGeneDbHttpClient {
    fn fetch_text(&self, url: &str) -> Result<String, MirError> {
        self.get(url)?
            .text()
            .map_err(|err| MirError::Http(err.to_string()))
    }

    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, MirError> {
        self.get(url)?
            .bytes()
            .map(|bytes| bytes.to_vec())
            .map_err(|err| MirError::Http(err.to_string()))
    }
}

pub fn download_page_url(base_url: &str) -> String {
    format!("{}/download", base_url.trim_end_matches('/'))
}

pub fn browse_url(base_url: &str, species: Species) -> String {
    format!("{}/browse/{}", base_url.trim_end_matches('/'), species.code())
}

/// Absolute hrefs are kept; relative ones are joined onto `base_url`.
pub fn resolve_href(base_url: &str, href: &str) -> Result<Url, MirError> {
    let base = Url::parse(base_url)
        .map_err(|err| MirError::InvalidUrl(format!("{base_url}: {err}")))?;
    base.join(href)
        .map_err(|err| MirError::InvalidUrl(format!("{href}: {err}")))
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
