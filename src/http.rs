use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;

pub const API_KEY_HEADER: &str = "x-apisports-key";

/// Raw reply from the remote API: status line plus unparsed body.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Seam between the fetch queue and the wire. The worker only ever asks
/// "GET this endpoint key"; building the URL and attaching auth is the
/// transport's business. Errors are the transport-level failures (DNS,
/// connect, timeout) that never produced a status line.
pub trait Transport: Send {
    fn get(&self, endpoint_key: &str) -> std::result::Result<HttpReply, String>;
}

pub struct HttpTransport {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpTransport {
    pub fn new(base_url: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(|s| s.to_string()),
        })
    }
}

impl Transport for HttpTransport {
    fn get(&self, endpoint_key: &str) -> std::result::Result<HttpReply, String> {
        let url = format!("{}/{}", self.base_url, endpoint_key);
        let mut req = self.client.get(&url);
        if let Some(key) = self.api_key.as_deref() {
            req = req.header(API_KEY_HEADER, key);
        }
        let resp = req.send().map_err(|err| err.to_string())?;
        let status = resp.status().as_u16();
        let body = resp.text().map_err(|err| err.to_string())?;
        Ok(HttpReply { status, body })
    }
}
