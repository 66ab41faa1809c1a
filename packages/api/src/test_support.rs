//! Hand-rolled fakes for the backend seams, shared by the unit tests.
//! Each fake records the calls it sees so tests can assert on ordering
//! side effects (what was inserted, deleted, removed, toggled).

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::backend::{
    AuthApi, ObjectStore, ProfileStore, ResumableUploader, UploadSource, VideoStore,
};
use crate::error::BackendError;
use crate::types::{NewVideo, Profile, Role, Session, User, Video};

pub fn user() -> User {
    User {
        id: Uuid::new_v4(),
        email: "tester@example.com".into(),
    }
}

pub fn profile_for(user: &User, role: Role, banned: bool) -> Profile {
    Profile {
        id: user.id,
        role,
        banned,
        created_at: Utc::now(),
    }
}

pub fn video_owned_by(user_id: Uuid) -> Video {
    Video {
        id: Uuid::new_v4(),
        user_id,
        title: "Clip".into(),
        description: String::new(),
        storage_path: format!("{user_id}/abc123-clip.mp4"),
        created_at: Utc::now(),
    }
}

pub fn source(name: &str, len: usize) -> UploadSource {
    UploadSource {
        file_name: name.into(),
        content_type: "video/mp4".into(),
        bytes: vec![0u8; len],
    }
}

#[derive(Default)]
pub struct FakeAuth {
    pub current: Mutex<Option<User>>,
    pub token: Mutex<Option<String>>,
    pub user_error: Option<BackendError>,
    pub signed_out: Mutex<bool>,
    pub fresh_token_calls: Mutex<u32>,
}

impl FakeAuth {
    pub fn signed_in(user: User) -> Self {
        Self {
            current: Mutex::new(Some(user)),
            token: Mutex::new(Some("test-token".into())),
            ..Self::default()
        }
    }
}

#[async_trait(?Send)]
impl AuthApi for FakeAuth {
    async fn sign_up(&self, _email: &str, _password: &str) -> Result<(), BackendError> {
        Ok(())
    }

    async fn sign_in(&self, _email: &str, _password: &str) -> Result<Session, BackendError> {
        Err(BackendError::Request("sign_in not wired in fake".into()))
    }

    async fn sign_out(&self) {
        *self.signed_out.lock().unwrap() = true;
        *self.current.lock().unwrap() = None;
        *self.token.lock().unwrap() = None;
    }

    async fn current_user(&self) -> Result<Option<User>, BackendError> {
        if let Some(e) = &self.user_error {
            return Err(e.clone());
        }
        Ok(self.current.lock().unwrap().clone())
    }

    async fn fresh_access_token(&self) -> Result<Option<String>, BackendError> {
        *self.fresh_token_calls.lock().unwrap() += 1;
        Ok(self.token.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct FakeProfiles {
    pub rows: Mutex<Vec<Profile>>,
    pub fetch_error: Option<BackendError>,
    /// Mutations seen, as `"{id} banned=.."` / `"{id} role=.."` lines.
    pub updates: Mutex<Vec<String>>,
}

impl FakeProfiles {
    pub fn with_rows(rows: Vec<Profile>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Self::default()
        }
    }
}

#[async_trait(?Send)]
impl ProfileStore for FakeProfiles {
    async fn fetch(&self, id: Uuid) -> Result<Option<Profile>, BackendError> {
        if let Some(e) = &self.fetch_error {
            return Err(e.clone());
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Profile>, BackendError> {
        let mut rows = self.rows.lock().unwrap().clone();
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn set_banned(&self, id: Uuid, banned: bool) -> Result<(), BackendError> {
        self.updates
            .lock()
            .unwrap()
            .push(format!("{id} banned={banned}"));
        Ok(())
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<(), BackendError> {
        self.updates
            .lock()
            .unwrap()
            .push(format!("{id} role={}", role.as_db()));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeVideos {
    pub rows: Mutex<Vec<Video>>,
    pub list_error: Option<BackendError>,
    pub insert_error: Option<BackendError>,
    pub inserted: Mutex<Vec<NewVideo>>,
    pub deleted: Mutex<Vec<Uuid>>,
}

impl FakeVideos {
    pub fn with_rows(rows: Vec<Video>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Self::default()
        }
    }
}

#[async_trait(?Send)]
impl VideoStore for FakeVideos {
    async fn list_recent(&self, limit: u32) -> Result<Vec<Video>, BackendError> {
        if let Some(e) = &self.list_error {
            return Err(e.clone());
        }
        let mut rows = self.rows.lock().unwrap().clone();
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Video>, BackendError> {
        if let Some(e) = &self.list_error {
            return Err(e.clone());
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.id == id)
            .cloned())
    }

    async fn insert(&self, video: &NewVideo) -> Result<(), BackendError> {
        if let Some(e) = &self.insert_error {
            return Err(e.clone());
        }
        self.inserted.lock().unwrap().push(video.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), BackendError> {
        self.deleted.lock().unwrap().push(id);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeObjects {
    pub removed: Mutex<Vec<String>>,
    pub remove_error: Option<BackendError>,
}

#[async_trait(?Send)]
impl ObjectStore for FakeObjects {
    fn public_url(&self, path: &str) -> String {
        format!("https://cdn.test/{path}")
    }

    async fn remove(&self, paths: &[String]) -> Result<(), BackendError> {
        if let Some(e) = &self.remove_error {
            return Err(e.clone());
        }
        self.removed.lock().unwrap().extend(paths.iter().cloned());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeUploader {
    pub error: Option<BackendError>,
    /// `(sent, total)` progress events replayed before the outcome.
    pub events: Vec<(u64, u64)>,
    pub uploads: Mutex<Vec<String>>,
}

#[async_trait(?Send)]
impl ResumableUploader for FakeUploader {
    async fn upload(
        &self,
        _access_token: &str,
        object_path: &str,
        _source: &UploadSource,
        on_progress: &mut (dyn FnMut(u64, u64)),
    ) -> Result<(), BackendError> {
        for (sent, total) in &self.events {
            on_progress(*sent, *total);
        }
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        self.uploads.lock().unwrap().push(object_path.to_string());
        Ok(())
    }
}
