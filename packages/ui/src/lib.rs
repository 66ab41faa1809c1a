//! This crate contains all shared UI for the workspace.

mod backend_ctx;
pub use backend_ctx::{provide_backend, use_backend, BackendHandle};

mod bootstrap;
pub use bootstrap::{load_saved_session, BrowserFingerprintStore, SessionSync};

mod use_user;
pub use use_user::{
    redirect_replace, use_user, RequireAdmin, RequireAuth, SignOutButton, UserState,
};

mod video_card;
pub use video_card::VideoCard;

mod format;
pub use format::{feed_caption, format_timestamp, show_empty_state};
