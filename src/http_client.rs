use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};

use crate::config;
use crate::error::SourceError;

static CLIENT: OnceCell<Client> = OnceCell::new();

pub fn http_client() -> reqwest::Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(config::http_timeout_secs()))
            .build()
    })
}

pub struct FetchedBody {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

pub fn fetch_bytes(url: &str) -> Result<FetchedBody, SourceError> {
    let client = http_client().map_err(|source| SourceError::Fetch {
        url: url.to_string(),
        source,
    })?;
    let resp = client
        .get(url)
        .header(USER_AGENT, "Mozilla/5.0")
        .send()
        .map_err(|source| SourceError::Fetch {
            url: url.to_string(),
            source,
        })?;
    let status = resp.status();
    if !status.is_success() {
        return Err(SourceError::Http {
            url: url.to_string(),
            status,
        });
    }
    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    let bytes = resp.bytes().map_err(|source| SourceError::Fetch {
        url: url.to_string(),
        source,
    })?;
    Ok(FetchedBody {
        bytes: bytes.to_vec(),
        content_type,
    })
}

pub fn fetch_json_text(url: &str) -> Result<String> {
    let client = http_client().context("failed to build http client")?;
    let resp = client
        .get(url)
        .header(USER_AGENT, "Mozilla/5.0")
        .send()
        .context("request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow::anyhow!("http {}: {}", status, body));
    }
    Ok(body)
}
