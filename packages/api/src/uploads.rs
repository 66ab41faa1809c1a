use rand::Rng;
use tracing::info;
use uuid::Uuid;

use crate::backend::{AuthApi, ResumableUploader, UploadSource, VideoStore};
use crate::error::BackendError;
use crate::types::{NewVideo, User};

/// Storage keys longer than this get truncated; keeps the final key inside
/// the platform's key-length limit.
pub const MAX_FILENAME_LEN: usize = 120;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadForm {
    pub title: String,
    pub description: String,
}

/// Everything validated and derived before any network activity happens.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedUpload<'a> {
    pub user_id: Uuid,
    pub object_path: String,
    pub title: String,
    pub description: String,
    pub source: &'a UploadSource,
}

/// Strip a user-supplied filename down to storage-key-safe form: trimmed,
/// whitespace runs collapsed to a single `-`, anything outside
/// `[A-Za-z0-9._-]` dropped, at most [`MAX_FILENAME_LEN`] characters.
/// Also neutralizes path traversal: no separator survives.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::new();
    let mut pending_hyphen = false;
    for c in name.trim().chars() {
        if c.is_whitespace() {
            pending_hyphen = true;
            continue;
        }
        if pending_hyphen {
            out.push('-');
            pending_hyphen = false;
        }
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            out.push(c);
        }
    }
    out.truncate(MAX_FILENAME_LEN);
    out
}

/// 128 random bits as hex; keeps two uploads of the same filename under the
/// same user prefix from colliding.
pub fn unique_upload_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill(&mut bytes[..]);
    hex::encode(bytes)
}

pub fn object_path(user_id: Uuid, unique_id: &str, file_name: &str) -> String {
    format!("{user_id}/{unique_id}-{}", sanitize_filename(file_name))
}

/// Percentage of a transfer, rounded to two decimals for display. Reaches
/// exactly 100 when `sent == total`.
pub fn progress_percent(sent: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    let pct = (sent as f64 / total as f64) * 100.0;
    (pct * 100.0).round() / 100.0
}

/// Pre-network validation, in order, each failure with its own message.
pub fn prepare_upload<'a>(
    user: Option<&User>,
    source: Option<&'a UploadSource>,
    form: &UploadForm,
) -> Result<PreparedUpload<'a>, BackendError> {
    let Some(source) = source else {
        return Err(BackendError::Validation("Choose a video file.".into()));
    };
    let title = form.title.trim();
    if title.is_empty() {
        return Err(BackendError::Validation("Title is required.".into()));
    }
    let Some(user) = user else {
        return Err(BackendError::Validation("Upload path error.".into()));
    };

    Ok(PreparedUpload {
        user_id: user.id,
        object_path: object_path(user.id, &unique_upload_id(), &source.file_name),
        title: title.to_string(),
        description: form.description.trim().to_string(),
        source,
    })
}

/// The whole flow: validate, fetch a fresh bearer token, run the resumable
/// transfer, and insert the metadata row only after the transfer reports
/// success. A failed insert is surfaced; the uploaded object stays put.
pub async fn perform_upload(
    auth: &dyn AuthApi,
    uploader: &dyn ResumableUploader,
    videos: &dyn VideoStore,
    user: Option<&User>,
    source: Option<&UploadSource>,
    form: &UploadForm,
    on_progress: &mut dyn FnMut(f64),
) -> Result<(), BackendError> {
    let prepared = prepare_upload(user, source, form)?;

    // Fetched at upload time so an expired cached token is never used.
    let token = auth
        .fresh_access_token()
        .await?
        .ok_or_else(|| BackendError::Validation("Not logged in.".into()))?;

    let mut relay = |sent: u64, total: u64| on_progress(progress_percent(sent, total));
    uploader
        .upload(&token, &prepared.object_path, prepared.source, &mut relay)
        .await?;
    info!("uploads.perform: transfer complete key={}", prepared.object_path);

    videos
        .insert(&NewVideo {
            user_id: prepared.user_id,
            title: prepared.title.clone(),
            description: prepared.description.clone(),
            storage_path: prepared.object_path.clone(),
        })
        .await?;
    info!("uploads.perform: metadata row written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{source, user, FakeAuth, FakeUploader, FakeVideos};

    fn form(title: &str) -> UploadForm {
        UploadForm {
            title: title.into(),
            description: "  about the clip  ".into(),
        }
    }

    #[test]
    fn sanitized_names_are_key_safe() {
        let cases = [
            ("My Cool Video.mp4", "My-Cool-Video.mp4"),
            ("  padded.mov  ", "padded.mov"),
            ("tabs\tand\nnewlines.mkv", "tabs-and-newlines.mkv"),
            ("../../etc/passwd", "....etcpasswd"),
            ("emoji 🎥 clip.mp4", "emoji--clip.mp4"),
        ];
        for (input, expected) in cases {
            let out = sanitize_filename(input);
            assert_eq!(out, expected);
            assert!(out
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')));
            assert!(!out.contains(char::is_whitespace));
        }

        let long = "x".repeat(400);
        assert_eq!(sanitize_filename(&long).len(), MAX_FILENAME_LEN);
    }

    #[test]
    fn object_paths_are_scoped_under_the_owner() {
        let u = user();
        let id = unique_upload_id();
        let path = object_path(u.id, &id, "my file.mp4");
        assert_eq!(path, format!("{}/{id}-my-file.mp4", u.id));
        assert_eq!(id.len(), 32);
        assert_ne!(unique_upload_id(), unique_upload_id());
    }

    #[test]
    fn progress_rounds_to_two_decimals_and_tops_out_at_100() {
        assert_eq!(progress_percent(500, 1000), 50.0);
        assert_eq!(format!("{:.2}", progress_percent(500, 1000)), "50.00");
        assert_eq!(format!("{:.2}", progress_percent(1000, 1000)), "100.00");
        assert_eq!(format!("{:.2}", progress_percent(1, 3)), "33.33");
        assert_eq!(progress_percent(0, 0), 100.0);
    }

    #[test]
    fn validation_messages_come_in_order() {
        let u = user();
        let src = source("clip.mp4", 10);

        let err = prepare_upload(Some(&u), None, &form("Title")).unwrap_err();
        assert_eq!(err, BackendError::Validation("Choose a video file.".into()));

        let err = prepare_upload(Some(&u), Some(&src), &form("   ")).unwrap_err();
        assert_eq!(err, BackendError::Validation("Title is required.".into()));

        let err = prepare_upload(None, Some(&src), &form("Title")).unwrap_err();
        assert_eq!(err, BackendError::Validation("Upload path error.".into()));

        let prepared = prepare_upload(Some(&u), Some(&src), &form("  Title  ")).unwrap();
        assert_eq!(prepared.title, "Title");
        assert_eq!(prepared.description, "about the clip");
        assert!(prepared.object_path.starts_with(&format!("{}/", u.id)));
        assert!(prepared.object_path.ends_with("-clip.mp4"));
    }

    #[tokio::test]
    async fn no_metadata_row_unless_the_transfer_succeeded() {
        let u = user();
        let auth = FakeAuth::signed_in(u.clone());
        let uploader = FakeUploader {
            error: Some(BackendError::RetriesExhausted("link died".into())),
            ..FakeUploader::default()
        };
        let videos = FakeVideos::default();
        let src = source("clip.mp4", 1000);
        let mut seen = Vec::new();

        let err = perform_upload(
            &auth,
            &uploader,
            &videos,
            Some(&u),
            Some(&src),
            &form("Title"),
            &mut |p| seen.push(p),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, BackendError::RetriesExhausted(_)));
        assert!(videos.inserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn successful_upload_writes_the_row_after_the_bytes() {
        let u = user();
        let auth = FakeAuth::signed_in(u.clone());
        let uploader = FakeUploader {
            events: vec![(0, 1000), (500, 1000), (1000, 1000)],
            ..FakeUploader::default()
        };
        let videos = FakeVideos::default();
        let src = source("clip.mp4", 1000);
        let mut seen = Vec::new();

        perform_upload(
            &auth,
            &uploader,
            &videos,
            Some(&u),
            Some(&src),
            &form("  Title  "),
            &mut |p| seen.push(p),
        )
        .await
        .unwrap();

        assert_eq!(seen, vec![0.0, 50.0, 100.0]);
        assert_eq!(*auth.fresh_token_calls.lock().unwrap(), 1);

        let inserted = videos.inserted.lock().unwrap();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].user_id, u.id);
        assert_eq!(inserted[0].title, "Title");
        assert_eq!(inserted[0].description, "about the clip");
        assert_eq!(
            inserted[0].storage_path,
            uploader.uploads.lock().unwrap()[0]
        );
    }

    #[tokio::test]
    async fn failed_row_insert_is_surfaced_without_rolling_back_the_object() {
        let u = user();
        let auth = FakeAuth::signed_in(u.clone());
        let uploader = FakeUploader::default();
        let videos = FakeVideos {
            insert_error: Some(BackendError::Request("row violates policy".into())),
            ..FakeVideos::default()
        };
        let src = source("clip.mp4", 10);

        let err = perform_upload(
            &auth,
            &uploader,
            &videos,
            Some(&u),
            Some(&src),
            &form("Title"),
            &mut |_| {},
        )
        .await
        .unwrap_err();

        assert_eq!(err, BackendError::Request("row violates policy".into()));
        // The transfer itself completed; the object stays put.
        assert_eq!(uploader.uploads.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn upload_requires_a_live_session() {
        let u = user();
        let auth = FakeAuth::default();
        let uploader = FakeUploader::default();
        let videos = FakeVideos::default();
        let src = source("clip.mp4", 10);

        let err = perform_upload(
            &auth,
            &uploader,
            &videos,
            Some(&u),
            Some(&src),
            &form("Title"),
            &mut |_| {},
        )
        .await
        .unwrap_err();

        assert_eq!(err, BackendError::Validation("Not logged in.".into()));
        assert!(uploader.uploads.lock().unwrap().is_empty());
    }
}
