use api::backend::AuthApi;
use api::session::resolve_identity;
use api::types::{Profile, User};
use dioxus::prelude::*;
use futures::StreamExt;

use crate::backend_ctx::{use_backend, BackendHandle};

/// What a view knows about the current visitor. `loading` stays true until
/// the first resolution cycle lands; redirect decisions must wait for it so
/// a page never flash-redirects on not-yet-loaded state.
#[derive(Debug, Clone, PartialEq)]
pub struct UserState {
    pub user: Option<User>,
    pub profile: Option<Profile>,
    pub is_admin: bool,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for UserState {
    fn default() -> Self {
        Self {
            user: None,
            profile: None,
            is_admin: false,
            loading: true,
            error: None,
        }
    }
}

/// Resolve identity on mount and again on every auth state change
/// (sign-in, sign-out, token refresh).
///
/// Cycles are numbered: a slow cycle finishing after a newer one has
/// already applied is discarded instead of clobbering fresher state.
pub fn use_user() -> Signal<UserState> {
    let backend = use_backend();
    let state = use_signal(UserState::default);
    let issued = use_signal(|| 0u64);
    let applied = use_signal(|| 0u64);

    use_effect(move || {
        let backend = backend.clone();
        spawn(async move {
            resolve_cycle(&backend, state, issued, applied).await;
            let mut events = backend.0.auth.subscribe();
            while events.next().await.is_some() {
                resolve_cycle(&backend, state, issued, applied).await;
            }
        });
    });

    state
}

fn is_stale(cycle: u64, applied: u64) -> bool {
    cycle <= applied
}

async fn resolve_cycle(
    backend: &BackendHandle,
    mut state: Signal<UserState>,
    mut issued: Signal<u64>,
    mut applied: Signal<u64>,
) {
    let cycle = issued() + 1;
    issued.set(cycle);

    let identity = resolve_identity(backend.0.auth.as_ref(), backend.0.profiles.as_ref()).await;

    if is_stale(cycle, applied()) {
        return;
    }
    applied.set(cycle);
    state.set(UserState {
        is_admin: identity.is_admin(),
        user: identity.user,
        profile: identity.profile,
        loading: false,
        error: identity.error,
    });
}

/// History-replacing client-side redirect, safe to call from effects.
pub fn redirect_replace(path: &'static str) {
    spawn(async move {
        let _ = document::eval(&format!("window.location.replace(\"{path}\")")).await;
    });
}

/// Redirects signed-out visitors to the login page once identity is known.
/// UX only: the backend's row-level-security policies are what actually
/// protect the data behind the page.
#[component]
pub fn RequireAuth(children: Element) -> Element {
    let state = use_user();

    use_effect(move || {
        let s = state();
        if !s.loading && s.user.is_none() {
            redirect_replace("/login");
        }
    });

    let s = state();
    if s.loading || s.user.is_none() {
        return rsx! {};
    }
    rsx! {
        {children}
    }
}

/// Admin-only wrapper: unauthenticated visitors go to login, signed-in
/// non-admins go home. Same caveat as [`RequireAuth`]: advisory only.
#[component]
pub fn RequireAdmin(children: Element) -> Element {
    let state = use_user();

    use_effect(move || {
        let s = state();
        if s.loading {
            return;
        }
        if s.user.is_none() {
            redirect_replace("/login");
        } else if !s.is_admin {
            redirect_replace("/");
        }
    });

    let s = state();
    if s.loading || !s.is_admin {
        return rsx! {};
    }
    rsx! {
        {children}
    }
}

#[component]
pub fn SignOutButton() -> Element {
    let backend = use_backend();

    rsx! {
        button {
            class: "btn",
            onclick: move |_| {
                let backend = backend.clone();
                spawn(async move {
                    backend.0.auth.sign_out().await;
                });
            },
            "Sign out"
        }
    }
}
