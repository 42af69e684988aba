//! blocking http for faucet, peer discovery, public ip and helm downloads

use crate::error::{Error, Result};
use std::time::Duration;
use tracing::debug;

pub trait HttpClient {
    fn get_text(&self, url: &str) -> Result<String>;
    fn get_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("allocmd/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self { client })
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::Network(format!("{}: {}", url, e)))?;
        if !response.status().is_success() {
            return Err(Error::Network(format!("{}: status {}", url, response.status())));
        }
        Ok(response)
    }
}

impl HttpClient for ReqwestClient {
    fn get_text(&self, url: &str) -> Result<String> {
        self.get(url)?
            .text()
            .map_err(|e| Error::Network(format!("{}: {}", url, e)))
    }

    fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.get(url)?
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| Error::Network(format!("{}: {}", url, e)))
    }
}
