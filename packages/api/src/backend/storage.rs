use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::auth::{AuthApi, AuthClient};
use super::response_error;
use crate::config::PublicConfig;
use crate::error::BackendError;

/// Bucket holding every uploaded video object.
pub const VIDEO_BUCKET: &str = "videos";

#[async_trait(?Send)]
pub trait ObjectStore {
    /// Browser-streamable URL for an object in the public video bucket.
    fn public_url(&self, path: &str) -> String;
    /// Remove objects by key. Callers that also hold a metadata row must
    /// only delete the row after this has succeeded.
    async fn remove(&self, paths: &[String]) -> Result<(), BackendError>;
}

/// Object storage over the platform's storage surface (`{base}/storage/v1`).
pub struct StorageClient {
    http: reqwest::Client,
    endpoint: String,
    anon_key: String,
    auth: Arc<AuthClient>,
}

impl StorageClient {
    pub fn new(http: reqwest::Client, config: &PublicConfig, auth: Arc<AuthClient>) -> Self {
        Self {
            http,
            endpoint: config.storage_endpoint(),
            anon_key: config.anon_key.clone(),
            auth,
        }
    }
}

#[async_trait(?Send)]
impl ObjectStore for StorageClient {
    fn public_url(&self, path: &str) -> String {
        format!("{}/object/public/{VIDEO_BUCKET}/{path}", self.endpoint)
    }

    async fn remove(&self, paths: &[String]) -> Result<(), BackendError> {
        debug!("storage.remove: {} object(s)", paths.len());
        let mut req = self
            .http
            .delete(format!("{}/object/{VIDEO_BUCKET}", self.endpoint))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "prefixes": paths }));
        if let Ok(Some(token)) = self.auth.fresh_access_token().await {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(response_error(resp).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_points_into_the_public_bucket() {
        let cfg = PublicConfig::new("https://abc.example.co", "anon");
        let http = reqwest::Client::new();
        let auth = Arc::new(AuthClient::new(http.clone(), &cfg));
        let storage = StorageClient::new(http, &cfg, auth);

        assert_eq!(
            storage.public_url("user-id/abc-clip.mp4"),
            "https://abc.example.co/storage/v1/object/public/videos/user-id/abc-clip.mp4"
        );
    }
}
