use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::auth::{AuthApi, AuthClient};
use super::response_error;
use crate::config::PublicConfig;
use crate::error::BackendError;
use crate::types::{NewVideo, Profile, Role, Video};

const PROFILE_COLUMNS: &str = "id,role,banned,created_at";
const VIDEO_COLUMNS: &str = "id,user_id,title,description,storage_path,created_at";

#[async_trait(?Send)]
pub trait ProfileStore {
    /// Single-row fetch; a missing row is `Ok(None)`, not an error.
    async fn fetch(&self, id: Uuid) -> Result<Option<Profile>, BackendError>;
    async fn list_recent(&self, limit: u32) -> Result<Vec<Profile>, BackendError>;
    async fn set_banned(&self, id: Uuid, banned: bool) -> Result<(), BackendError>;
    async fn set_role(&self, id: Uuid, role: Role) -> Result<(), BackendError>;
}

#[async_trait(?Send)]
pub trait VideoStore {
    async fn list_recent(&self, limit: u32) -> Result<Vec<Video>, BackendError>;
    /// Single-row fetch; a missing row is `Ok(None)`, not an error.
    async fn fetch(&self, id: Uuid) -> Result<Option<Video>, BackendError>;
    async fn insert(&self, video: &NewVideo) -> Result<(), BackendError>;
    async fn delete(&self, id: Uuid) -> Result<(), BackendError>;
}

/// Table access over the platform's REST surface (`{base}/rest/v1`).
///
/// Row-level security on the backend decides what each call may actually
/// read or mutate; nothing here is an enforcement point.
pub struct RestStore {
    http: reqwest::Client,
    endpoint: String,
    anon_key: String,
    auth: Arc<AuthClient>,
}

fn newest_first(select: &str, limit: u32) -> Vec<(String, String)> {
    vec![
        ("select".into(), select.into()),
        ("order".into(), "created_at.desc".into()),
        ("limit".into(), limit.to_string()),
    ]
}

fn by_id(select: &str, id: Uuid) -> Vec<(String, String)> {
    vec![
        ("select".into(), select.into()),
        ("id".into(), format!("eq.{id}")),
        ("limit".into(), "1".into()),
    ]
}

fn id_filter(id: Uuid) -> Vec<(String, String)> {
    vec![("id".into(), format!("eq.{id}"))]
}

impl RestStore {
    pub fn new(http: reqwest::Client, config: &PublicConfig, auth: Arc<AuthClient>) -> Self {
        Self {
            http,
            endpoint: config.rest_endpoint(),
            anon_key: config.anon_key.clone(),
            auth,
        }
    }

    async fn request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .http
            .request(method, format!("{}/{}", self.endpoint, table))
            .header("apikey", &self.anon_key);
        // Anonymous when there is no session; row-level security narrows the
        // anonymous view accordingly.
        if let Ok(Some(token)) = self.auth.fresh_access_token().await {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(String, String)],
    ) -> Result<Vec<T>, BackendError> {
        let resp = self
            .request(reqwest::Method::GET, table)
            .await
            .query(query)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(response_error(resp).await);
        }
        Ok(resp.json().await?)
    }

    async fn mutate<B: Serialize>(
        &self,
        method: reqwest::Method,
        table: &str,
        query: &[(String, String)],
        body: Option<&B>,
    ) -> Result<(), BackendError> {
        let mut req = self
            .request(method, table)
            .await
            .query(query)
            .header("Prefer", "return=minimal");
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(response_error(resp).await);
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl ProfileStore for RestStore {
    async fn fetch(&self, id: Uuid) -> Result<Option<Profile>, BackendError> {
        let rows: Vec<Profile> = self.select("profiles", &by_id(PROFILE_COLUMNS, id)).await?;
        Ok(rows.into_iter().next())
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Profile>, BackendError> {
        self.select("profiles", &newest_first(PROFILE_COLUMNS, limit))
            .await
    }

    async fn set_banned(&self, id: Uuid, banned: bool) -> Result<(), BackendError> {
        debug!("rest.set_banned: id={id} banned={banned}");
        self.mutate(
            reqwest::Method::PATCH,
            "profiles",
            &id_filter(id),
            Some(&serde_json::json!({ "banned": banned })),
        )
        .await
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<(), BackendError> {
        debug!("rest.set_role: id={id} role={}", role.as_db());
        self.mutate(
            reqwest::Method::PATCH,
            "profiles",
            &id_filter(id),
            Some(&serde_json::json!({ "role": role })),
        )
        .await
    }
}

#[async_trait(?Send)]
impl VideoStore for RestStore {
    async fn list_recent(&self, limit: u32) -> Result<Vec<Video>, BackendError> {
        self.select("videos", &newest_first(VIDEO_COLUMNS, limit))
            .await
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Video>, BackendError> {
        let rows: Vec<Video> = self.select("videos", &by_id(VIDEO_COLUMNS, id)).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert(&self, video: &NewVideo) -> Result<(), BackendError> {
        debug!("rest.insert_video: path={}", video.storage_path);
        self.mutate(reqwest::Method::POST, "videos", &[], Some(video))
            .await
    }

    async fn delete(&self, id: Uuid) -> Result<(), BackendError> {
        debug!("rest.delete_video: id={id}");
        self.mutate::<()>(reqwest::Method::DELETE, "videos", &id_filter(id), None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_first_orders_and_limits() {
        let q = newest_first(VIDEO_COLUMNS, 60);
        assert_eq!(
            q,
            vec![
                ("select".to_string(), VIDEO_COLUMNS.to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
                ("limit".to_string(), "60".to_string()),
            ]
        );
    }

    #[test]
    fn by_id_builds_an_eq_filter_with_limit_one() {
        let id = Uuid::nil();
        let q = by_id(PROFILE_COLUMNS, id);
        assert!(q.contains(&("id".to_string(), format!("eq.{id}"))));
        assert!(q.contains(&("limit".to_string(), "1".to_string())));
    }

    #[test]
    fn column_projections_have_no_spaces() {
        assert!(!PROFILE_COLUMNS.contains(' '));
        assert!(!VIDEO_COLUMNS.contains(' '));
    }
}
