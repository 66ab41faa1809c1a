//! Browser-side persistence: the auth session and open upload sessions both
//! survive a page reload through localStorage.

use api::backend::{AuthEvent, FingerprintStore};
use api::types::Session;
use async_trait::async_trait;
use dioxus::prelude::*;
use futures::StreamExt;
use tracing::debug;

use crate::backend_ctx::use_backend;

const SESSION_KEY: &str = "vidlet_session";
const FINGERPRINT_PREFIX: &str = "vidlet_upload::";

pub(crate) fn js_escape(s: &str) -> String {
    // Minimal JS string escape for embedding into a double-quoted string.
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

async fn local_storage_get(key: &str) -> Option<String> {
    let js = format!(
        r#"(function(){{
            try {{ return localStorage.getItem("{}") || ""; }}
            catch(e) {{ return ""; }}
        }})()"#,
        js_escape(key)
    );
    let v = document::eval(&js).await.ok()?;
    let saved = v.as_str()?.to_string();
    if saved.trim().is_empty() {
        None
    } else {
        Some(saved)
    }
}

async fn local_storage_set(key: &str, value: &str) {
    let _ = document::eval(&format!(
        r#"(function(){{ try {{ localStorage.setItem("{}", "{}"); }} catch(e) {{}} return ""; }})()"#,
        js_escape(key),
        js_escape(value)
    ))
    .await;
}

async fn local_storage_remove(key: &str) {
    let _ = document::eval(&format!(
        r#"(function(){{ try {{ localStorage.removeItem("{}"); }} catch(e) {{}} return ""; }})()"#,
        js_escape(key)
    ))
    .await;
}

/// Best-effort read of the session a previous page load persisted. Call
/// before the first render so the initial identity resolution already sees
/// the restored session.
pub async fn load_saved_session() -> Option<Session> {
    let raw = local_storage_get(SESSION_KEY).await?;
    match serde_json::from_str::<Session>(&raw) {
        Ok(session) => Some(session),
        Err(e) => {
            debug!("bootstrap: discarding unreadable saved session: {e}");
            local_storage_remove(SESSION_KEY).await;
            None
        }
    }
}

/// Keeps localStorage in sync with auth state changes: sign-in and token
/// refresh persist the session, sign-out removes it.
#[component]
pub fn SessionSync() -> Element {
    let backend = use_backend();

    use_effect(move || {
        let backend = backend.clone();
        spawn(async move {
            let mut events = backend.0.auth.subscribe();
            while let Some(event) = events.next().await {
                match event {
                    AuthEvent::SignedIn(s) | AuthEvent::TokenRefreshed(s) => {
                        if let Ok(raw) = serde_json::to_string(&s) {
                            local_storage_set(SESSION_KEY, &raw).await;
                        }
                    }
                    AuthEvent::SignedOut => local_storage_remove(SESSION_KEY).await,
                }
            }
        });
    });

    rsx! {}
}

/// Fingerprint store backed by localStorage, so an interrupted upload can
/// resume from its last committed offset even after a browser refresh.
pub struct BrowserFingerprintStore;

#[async_trait(?Send)]
impl FingerprintStore for BrowserFingerprintStore {
    async fn get(&self, fingerprint: &str) -> Option<String> {
        local_storage_get(&format!("{FINGERPRINT_PREFIX}{fingerprint}")).await
    }

    async fn set(&self, fingerprint: &str, upload_url: &str) {
        local_storage_set(&format!("{FINGERPRINT_PREFIX}{fingerprint}"), upload_url).await;
    }

    async fn remove(&self, fingerprint: &str) {
        local_storage_remove(&format!("{FINGERPRINT_PREFIX}{fingerprint}")).await;
    }
}
