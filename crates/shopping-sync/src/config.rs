//! Remote Configuration
//!
//! Where the hosted store lives and how to authenticate against it.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

fn default_heartbeat_secs() -> u32 {
    25
}

/// Hosted store endpoint and anonymous API key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub url: String,
    pub anon_key: String,
    /// Realtime heartbeat period
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u32,
}

impl RemoteConfig {
    pub fn new(url: &str, anon_key: &str) -> SyncResult<Self> {
        let url = url.trim().trim_end_matches('/');
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(SyncError::Config(format!("URL must start with http(s)://: {}", url)));
        }
        if anon_key.trim().is_empty() {
            return Err(SyncError::Config("API key is empty".to_string()));
        }
        Ok(Self {
            url: url.to_string(),
            anon_key: anon_key.trim().to_string(),
            heartbeat_secs: default_heartbeat_secs(),
        })
    }

    /// Build from optional settings; `None` when neither is provided
    pub fn from_values(url: Option<&str>, anon_key: Option<&str>) -> SyncResult<Option<Self>> {
        let url = url.filter(|s| !s.trim().is_empty());
        let anon_key = anon_key.filter(|s| !s.trim().is_empty());
        match (url, anon_key) {
            (None, None) => Ok(None),
            (Some(url), Some(key)) => Self::new(url, key).map(Some),
            (Some(_), None) => Err(SyncError::Config("API key is missing".to_string())),
            (None, Some(_)) => Err(SyncError::Config("URL is missing".to_string())),
        }
    }

    /// REST endpoint of a collection
    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    /// Websocket endpoint of the realtime service
    pub fn realtime_url(&self) -> String {
        let base = if let Some(rest) = self.url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.url.clone()
        };
        format!(
            "{}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            base,
            utf8_percent_encode(&self.anon_key, NON_ALPHANUMERIC)
        )
    }
}
