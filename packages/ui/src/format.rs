use chrono::{DateTime, Utc};

/// Compact timestamp for cards and tables.
pub fn format_timestamp(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M").to_string()
}

/// The explicit empty state only shows once loading finished with zero
/// rows; it never replaces the loading indicator.
pub fn show_empty_state(loading: bool, row_count: usize) -> bool {
    !loading && row_count == 0
}

pub fn feed_caption(loading: bool, row_count: usize) -> String {
    if loading {
        "Loading…".into()
    } else {
        format!("{row_count} videos")
    }
}
