//! Connectivity detection.
//!
//! The write path and the sync driver both need a yes/no answer to "can
//! we reach the backend right now". The production probe asks the auth
//! health endpoint with a short timeout; tests substitute a mock.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::config::BackendConfig;
use crate::error::SkymarkError;

/// Answers whether the backend is currently reachable.
#[cfg_attr(test, mockall::automock)]
pub trait ConnectivityProbe {
    /// True if a request to the backend is likely to get through.
    fn is_online(&self) -> bool;
}

/// Probe that performs a HEAD request against the backend health endpoint.
pub struct HttpProbe {
    http: Client,
    url: String,
}

impl HttpProbe {
    /// Build a probe from backend settings with the given timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &BackendConfig, timeout_secs: u64) -> Result<Self, SkymarkError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SkymarkError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            url: format!("{}/auth/v1/health", config.url.trim_end_matches('/')),
        })
    }
}

impl ConnectivityProbe for HttpProbe {
    fn is_online(&self) -> bool {
        // Any HTTP answer counts as reachable; only transport failures
        // (refused, timed out, no route) mean offline.
        match self.http.head(&self.url).send() {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "connectivity probe failed");
                false
            }
        }
    }
}
