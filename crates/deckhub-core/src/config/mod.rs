//! Runtime configuration for the external catalog boundary.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::is_http_url;

/// Default external catalog endpoint
pub const DEFAULT_CATALOG_BASE_URL: &str = "https://api.scryfall.com";

const DEFAULT_CATALOG_TIMEOUT_SECS: u64 = 10;

/// Configuration for the external card catalog client.
///
/// The catalog is consumed read-only; there is nothing to configure beyond
/// where it lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Catalog base URL, must include `http://` or `https://`
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CATALOG_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_CATALOG_TIMEOUT_SECS),
        }
    }
}

impl CatalogConfig {
    /// Validate the configured base URL and strip any trailing slash.
    pub fn normalized_base_url(&self) -> Result<String> {
        let url = self.base_url.trim();
        if !is_http_url(url) {
            return Err(Error::InvalidArgument(format!(
                "catalog base URL must include http:// or https://, got '{url}'"
            )));
        }
        Ok(url.trim_end_matches('/').to_string())
    }
}
