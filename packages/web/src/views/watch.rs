use api::backend::ObjectStore;
use dioxus::prelude::*;
use ui::{format_timestamp, use_backend};
use uuid::Uuid;

#[component]
pub fn Watch(id: String) -> Element {
    let backend = use_backend();
    // A malformed id behaves exactly like a missing row: empty, not an error.
    let parsed = Uuid::parse_str(&id).ok();

    let fetch_backend = backend.clone();
    let video = use_resource(move || {
        let backend = fetch_backend.clone();
        async move {
            match parsed {
                Some(vid) => api::videos::watch_video(backend.0.videos.as_ref(), vid).await,
                None => Ok(None),
            }
        }
    });

    rsx! {
        div { class: "card",
            div { class: "row",
                Link { class: "btn", to: crate::Route::Home {}, "← Back" }
                div { class: "spacer" }
            }
            match video() {
                None => rsx! {
                    p { class: "hint", "Loading…" }
                },
                Some(Err(e)) => rsx! {
                    p { class: "error", "{e}" }
                },
                Some(Ok(None)) => rsx! {
                    p { class: "hint", "Video not found." }
                },
                Some(Ok(Some(v))) => {
                    let url = backend.0.objects.public_url(&v.storage_path);
                    rsx! {
                        div { class: "video_frame",
                            video {
                                class: "video_player",
                                src: "{url}",
                                controls: true,
                                preload: "metadata",
                            }
                        }
                        h1 { "{v.title}" }
                        p { class: "hint", {format_timestamp(&v.created_at)} }
                        if !v.description.is_empty() {
                            div { class: "card",
                                p { class: "prewrap", "{v.description}" }
                            }
                        }
                    }
                }
            }
        }
    }
}
