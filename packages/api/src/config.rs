use dioxus::prelude::ServerFnError;
use serde::{Deserialize, Serialize};

/// Runtime configuration the browser needs to reach the backend platform.
///
/// Read from the environment on the server and fetched by the client once at
/// startup; the backend client is then built from it exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicConfig {
    pub backend_url: String,
    pub anon_key: String,
}

impl PublicConfig {
    pub fn new(backend_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let backend_url = backend_url.into().trim_end_matches('/').to_string();
        Self {
            backend_url,
            anon_key: anon_key.into(),
        }
    }

    pub fn auth_endpoint(&self) -> String {
        format!("{}/auth/v1", self.backend_url)
    }

    pub fn rest_endpoint(&self) -> String {
        format!("{}/rest/v1", self.backend_url)
    }

    pub fn storage_endpoint(&self) -> String {
        format!("{}/storage/v1", self.backend_url)
    }

    /// Resumable upload endpoint; the session for a transfer is created here
    /// and chunks are PATCHed to the URL the backend hands back.
    pub fn resumable_endpoint(&self) -> String {
        format!("{}/storage/v1/upload/resumable", self.backend_url)
    }
}

pub async fn public_config() -> Result<PublicConfig, ServerFnError> {
    let backend_url =
        std::env::var("BACKEND_URL").map_err(|_| ServerFnError::new("BACKEND_URL not set"))?;
    let anon_key = std::env::var("BACKEND_ANON_KEY")
        .map_err(|_| ServerFnError::new("BACKEND_ANON_KEY not set"))?;

    Ok(PublicConfig::new(backend_url, anon_key))
}
