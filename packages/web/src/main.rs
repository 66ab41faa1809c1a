use std::sync::Arc;

use api::backend::Backend;
use dioxus::prelude::*;

use views::{Admin, Home, Login, Signup, Upload, Watch};

mod views;

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum Route {
    #[layout(NavbarLayout)]
    #[route("/")]
    Home {},
    #[route("/login")]
    Login {},
    #[route("/signup")]
    Signup {},
    #[route("/upload")]
    Upload {},
    #[route("/watch/:id")]
    Watch { id: String },
    #[route("/admin")]
    Admin {},
}

const MAIN_CSS: Asset = asset!("/assets/main.css");

fn main() {
    #[cfg(feature = "server")]
    init_server();
    dioxus::launch(App);
}

/// Server-side startup: env, logging, and the fail-fast check on the two
/// variables the whole app depends on.
#[cfg(feature = "server")]
fn init_server() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    for key in ["BACKEND_URL", "BACKEND_ANON_KEY"] {
        if std::env::var(key).map(|v| v.trim().is_empty()).unwrap_or(true) {
            eprintln!("startup: {key} must be set");
            std::process::exit(1);
        }
    }
    tracing::info!("startup: backend configured");
}

#[component]
fn App() -> Element {
    // The backend client is built once, from runtime configuration fetched
    // off the server, then provided to the whole tree via context.
    let mut backend = use_signal(|| None::<Arc<Backend>>);
    let mut boot_error = use_signal(|| None::<String>);

    use_effect(move || {
        spawn(async move {
            match api::public_config().await {
                Ok(cfg) => {
                    let built = Arc::new(Backend::with_fingerprints(
                        cfg,
                        Arc::new(ui::BrowserFingerprintStore),
                    ));
                    // Restore any persisted session before the first render
                    // so the initial identity resolution already sees it.
                    if let Some(saved) = ui::load_saved_session().await {
                        built.auth.restore_session(saved);
                    }
                    backend.set(Some(built));
                }
                Err(e) => {
                    tracing::error!("startup: config fetch failed: {e}");
                    boot_error.set(Some(e.to_string()));
                }
            }
        });
    });

    rsx! {
        document::Link { rel: "stylesheet", href: MAIN_CSS }
        match backend() {
            Some(b) => rsx! {
                Shell { backend: ui::BackendHandle(b) }
            },
            None => rsx! {
                div { class: "container",
                    if let Some(err) = boot_error() {
                        p { class: "error", "Configuration error: {err}" }
                    } else {
                        p { class: "hint", "Loading…" }
                    }
                }
            },
        }
    }
}

#[component]
fn Shell(backend: ui::BackendHandle) -> Element {
    ui::provide_backend(backend.0.clone());

    rsx! {
        ui::SessionSync {}
        Router::<Route> {}
    }
}

#[component]
fn NavbarLayout() -> Element {
    let state = ui::use_user();
    let s = state();

    rsx! {
        div { class: "container",
            div { class: "card nav",
                div { class: "row",
                    Link { class: "brand", to: Route::Home {}, "Vidlet" }
                    div { class: "spacer" }
                    if !s.loading {
                        if let Some(user) = s.user.clone() {
                            Link { class: "btn", to: Route::Upload {}, "Upload" }
                            if s.is_admin {
                                Link { class: "btn", to: Route::Admin {}, "Admin" }
                            }
                            span { class: "hint", "{user.email}" }
                            if s.profile.as_ref().is_some_and(|p| p.role == api::types::Role::Admin) {
                                span { class: "badge", "admin" }
                            }
                            ui::SignOutButton {}
                        } else {
                            Link { class: "btn", to: Route::Login {}, "Log in" }
                            Link { class: "btn primary", to: Route::Signup {}, "Sign up" }
                        }
                    }
                }
            }
            div { class: "route_view", Outlet::<Route> {} }
        }
    }
}
