use tracing::{debug, info};

use crate::backend::{AuthApi, ProfileStore};
use crate::types::{Profile, User};

/// Snapshot produced by one identity-resolution cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Identity {
    pub user: Option<User>,
    pub profile: Option<Profile>,
    /// Set when a fetch failed mid-cycle; distinct from "no profile row
    /// exists" so callers never have to guess which one happened.
    pub error: Option<String>,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.profile.as_ref().is_some_and(Profile::is_admin)
    }
}

/// Resolve the current user and their profile row.
///
/// Absence of a session is a valid signed-out state, not an error. A banned
/// profile forces a sign-out within the same cycle: a banned account must
/// not keep a usable session even if the ban landed after sign-in.
pub async fn resolve_identity(auth: &dyn AuthApi, profiles: &dyn ProfileStore) -> Identity {
    let user = match auth.current_user().await {
        Ok(user) => user,
        Err(e) => {
            debug!("session.resolve: user fetch failed: {e}");
            return Identity {
                error: Some(e.to_string()),
                ..Identity::default()
            };
        }
    };
    let Some(user) = user else {
        debug!("session.resolve: signed out");
        return Identity::default();
    };

    match profiles.fetch(user.id).await {
        Ok(Some(profile)) if profile.banned => {
            info!(
                "session.resolve: banned profile, forcing sign-out user_id={}",
                user.id
            );
            auth.sign_out().await;
            Identity::default()
        }
        Ok(profile) => Identity {
            user: Some(user),
            profile,
            error: None,
        },
        Err(e) => Identity {
            user: Some(user),
            profile: None,
            error: Some(e.to_string()),
        },
    }
}
