//! Directory service lookups.
//!
//! Read-only lists of departments, locations and roles used to populate
//! scope filter pickers. Each list is a plain `[{id, name}]` fetch.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DirectoryConfig;
use crate::error::{Error, Result};

const DIRECTORY_TIMEOUT_SECS: u64 = 10;

/// Which directory list to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectoryKind {
    Departments,
    Locations,
    Roles,
}

impl DirectoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectoryKind::Departments => "departments",
            DirectoryKind::Locations => "locations",
            DirectoryKind::Roles => "roles",
        }
    }
}

impl fmt::Display for DirectoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DirectoryKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "departments" => Ok(DirectoryKind::Departments),
            "locations" => Ok(DirectoryKind::Locations),
            "roles" => Ok(DirectoryKind::Roles),
            other => Err(Error::Parse(format!("Unknown directory list: {}", other))),
        }
    }
}

/// One selectable entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub id: String,
    pub name: String,
}

/// Client for the directory service.
pub struct DirectoryClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl DirectoryClient {
    pub fn from_config(config: &DirectoryConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| Error::Config("directory.base_url is not set".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(DIRECTORY_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Fetch one list, in the order the service returns it.
    pub async fn list(&self, kind: DirectoryKind) -> Result<Vec<DirectoryEntry>> {
        let url = format!("{}/{}", self.base_url, kind);
        debug!("GET {}", url);

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Directory(format!(
                "{} lookup returned HTTP {}",
                kind,
                status.as_u16()
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| Error::Directory(format!("Invalid {} list: {}", kind, e)))
    }
}
