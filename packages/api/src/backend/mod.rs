use std::fmt;
use std::sync::Arc;

use crate::config::PublicConfig;
use crate::error::BackendError;

pub mod auth;
pub mod rest;
pub mod resumable;
pub mod storage;

pub use auth::{AuthApi, AuthClient, AuthEvent};
pub use rest::{ProfileStore, VideoStore};
pub use resumable::{
    FingerprintStore, MemoryFingerprintStore, ResumableUploader, UploadSource,
};
pub use storage::{ObjectStore, VIDEO_BUCKET};

/// Handle to the backend platform, built exactly once at application start
/// and passed explicitly to everything that talks to it.
///
/// Holds no authoritative state: every read re-fetches, and the only thing
/// cached locally is the auth session.
pub struct Backend {
    pub config: PublicConfig,
    pub auth: Arc<AuthClient>,
    pub profiles: Arc<dyn ProfileStore>,
    pub videos: Arc<dyn VideoStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub uploader: Arc<dyn ResumableUploader>,
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Backend {
    pub fn new(config: PublicConfig) -> Self {
        Self::with_fingerprints(config, Arc::new(MemoryFingerprintStore::new()))
    }

    /// Like [`Backend::new`], but with a caller-provided fingerprint store so
    /// interrupted uploads can be resumed across page reloads.
    pub fn with_fingerprints(
        config: PublicConfig,
        fingerprints: Arc<dyn FingerprintStore>,
    ) -> Self {
        let http = reqwest::Client::new();
        let auth = Arc::new(AuthClient::new(http.clone(), &config));
        let rest = Arc::new(rest::RestStore::new(http.clone(), &config, auth.clone()));
        let objects = Arc::new(storage::StorageClient::new(
            http.clone(),
            &config,
            auth.clone(),
        ));
        let uploader = Arc::new(resumable::TusClient::new(http, &config, fingerprints));

        Self {
            config,
            auth,
            profiles: rest.clone(),
            videos: rest,
            objects,
            uploader,
        }
    }
}

/// Turn a non-success response into the backend's own message where one is
/// present, so the user sees what the platform said.
pub(crate) async fn response_error(resp: reqwest::Response) -> BackendError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|k| v.get(k).and_then(|m| m.as_str()).map(str::to_owned))
        })
        .unwrap_or_else(|| format!("request failed with status {status}"));
    BackendError::Request(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_builds_from_config() {
        let backend = Backend::new(PublicConfig::new("https://abc.example.co/", "anon"));
        assert_eq!(backend.config.backend_url, "https://abc.example.co");
        assert_eq!(
            backend.objects.public_url("u/x.mp4"),
            "https://abc.example.co/storage/v1/object/public/videos/u/x.mp4"
        );
    }
}
