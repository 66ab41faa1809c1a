//! Moderation actions. All of them are advisory UI over the backend: the
//! platform's row-level-security policies are the authoritative check on
//! every call here, and the only serialization point between concurrent
//! admin sessions.

use tracing::info;

use crate::backend::{ObjectStore, ProfileStore, VideoStore};
use crate::error::BackendError;
use crate::types::{Profile, Video};

/// Bulk-load window for the moderation tables.
pub const ADMIN_PAGE_LIMIT: u32 = 200;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConsoleData {
    pub profiles: Vec<Profile>,
    pub videos: Vec<Video>,
}

pub async fn load_console(
    profiles: &dyn ProfileStore,
    videos: &dyn VideoStore,
) -> Result<ConsoleData, BackendError> {
    let profiles = profiles.list_recent(ADMIN_PAGE_LIMIT).await?;
    let videos = videos.list_recent(ADMIN_PAGE_LIMIT).await?;
    Ok(ConsoleData { profiles, videos })
}

pub async fn toggle_ban(
    profiles: &dyn ProfileStore,
    profile: &Profile,
) -> Result<(), BackendError> {
    info!("admin.toggle_ban: id={} banned={}", profile.id, !profile.banned);
    profiles.set_banned(profile.id, !profile.banned).await
}

pub async fn toggle_role(
    profiles: &dyn ProfileStore,
    profile: &Profile,
) -> Result<(), BackendError> {
    let next = profile.role.toggled();
    info!("admin.toggle_role: id={} role={}", profile.id, next.as_db());
    profiles.set_role(profile.id, next).await
}

/// Storage object first, metadata row second. If the removal fails the row
/// is preserved, so a row never outlives confirmation of its object and the
/// console cannot leave a reference to a nonexistent object behind.
pub async fn delete_video(
    objects: &dyn ObjectStore,
    videos: &dyn VideoStore,
    video: &Video,
) -> Result<(), BackendError> {
    objects
        .remove(std::slice::from_ref(&video.storage_path))
        .await?;
    info!("admin.delete_video: object removed path={}", video.storage_path);
    videos.delete(video.id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{profile_for, user, video_owned_by, FakeObjects, FakeProfiles, FakeVideos};
    use crate::types::Role;

    #[tokio::test]
    async fn row_delete_never_runs_when_object_removal_fails() {
        let objects = FakeObjects {
            remove_error: Some(BackendError::Request("object is locked".into())),
            ..FakeObjects::default()
        };
        let videos = FakeVideos::default();
        let row = video_owned_by(user().id);

        let err = delete_video(&objects, &videos, &row).await.unwrap_err();
        assert_eq!(err, BackendError::Request("object is locked".into()));
        assert!(videos.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_object_then_row() {
        let objects = FakeObjects::default();
        let videos = FakeVideos::default();
        let row = video_owned_by(user().id);

        delete_video(&objects, &videos, &row).await.unwrap();
        assert_eq!(
            *objects.removed.lock().unwrap(),
            vec![row.storage_path.clone()]
        );
        assert_eq!(*videos.deleted.lock().unwrap(), vec![row.id]);
    }

    #[tokio::test]
    async fn role_toggle_round_trips() {
        let u = user();
        let profiles = FakeProfiles::default();

        let plain = profile_for(&u, Role::User, false);
        toggle_role(&profiles, &plain).await.unwrap();

        let promoted = Profile {
            role: Role::Admin,
            ..plain.clone()
        };
        toggle_role(&profiles, &promoted).await.unwrap();

        let updates = profiles.updates.lock().unwrap();
        assert_eq!(updates[0], format!("{} role=admin", u.id));
        assert_eq!(updates[1], format!("{} role=user", u.id));
    }

    #[tokio::test]
    async fn ban_toggle_flips_the_current_flag() {
        let u = user();
        let profiles = FakeProfiles::default();

        toggle_ban(&profiles, &profile_for(&u, Role::User, false))
            .await
            .unwrap();
        toggle_ban(&profiles, &profile_for(&u, Role::User, true))
            .await
            .unwrap();

        let updates = profiles.updates.lock().unwrap();
        assert_eq!(updates[0], format!("{} banned=true", u.id));
        assert_eq!(updates[1], format!("{} banned=false", u.id));
    }

    #[tokio::test]
    async fn console_load_fetches_both_windows() {
        let u = user();
        let profiles = FakeProfiles::with_rows(vec![profile_for(&u, Role::User, false)]);
        let videos = FakeVideos::with_rows(vec![video_owned_by(u.id)]);

        let data = load_console(&profiles, &videos).await.unwrap();
        assert_eq!(data.profiles.len(), 1);
        assert_eq!(data.videos.len(), 1);
    }
}
