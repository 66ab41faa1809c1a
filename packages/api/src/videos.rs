use tracing::debug;
use uuid::Uuid;

use crate::backend::VideoStore;
use crate::error::BackendError;
use crate::types::Video;

/// Most recent rows shown on the explore feed.
pub const FEED_LIMIT: u32 = 60;

pub async fn explore_feed(videos: &dyn VideoStore) -> Result<Vec<Video>, BackendError> {
    let rows = videos.list_recent(FEED_LIMIT).await?;
    debug!("videos.explore_feed: {} row(s)", rows.len());
    Ok(rows)
}

/// Single-row fetch for the watch page. A missing id is a valid empty
/// outcome, distinct from a transport or backend error.
pub async fn watch_video(videos: &dyn VideoStore, id: Uuid) -> Result<Option<Video>, BackendError> {
    videos.fetch(id).await
}
