//! Admin view configuration
//!
//! Loaded from TOML (deployment file) or JSON (handed over by the host page).
//! Every field has a default.

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::upload::{UploadPolicy, ALLOWED_EXTENSIONS, MAX_UPLOAD_BYTES};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Base URL of the data service, e.g. `https://host/api`
    pub api_base_url: String,
    /// Largest accepted spreadsheet in bytes (default: 100 MiB)
    pub max_upload_bytes: u64,
    /// Accepted filename suffixes (default: `.xlsx`, `.xls`)
    pub allowed_extensions: Vec<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            api_base_url: "/api".to_string(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl AdminConfig {
    /// Parse configuration from a TOML string
    ///
    /// # Example
    ///
    /// ```
    /// use preforeclosure_core::config::AdminConfig;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = AdminConfig::from_toml_str(r#"api_base_url = "https://records.example/api""#)?;
    /// assert_eq!(config.max_upload_bytes, 104_857_600);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }

    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        serde_json::from_str(s).context("Failed to parse JSON configuration")
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy {
            max_bytes: self.max_upload_bytes,
            allowed_extensions: self.allowed_extensions.clone(),
        }
    }

    /// Join a path onto the API base without doubling slashes
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
