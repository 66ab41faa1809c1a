use dioxus::prelude::*;
use ui::{feed_caption, show_empty_state, use_backend, VideoCard};

#[component]
pub fn Home() -> Element {
    let backend = use_backend();
    let feed_backend = backend.clone();
    let videos = use_resource(move || {
        let backend = feed_backend.clone();
        async move { api::videos::explore_feed(backend.0.videos.as_ref()).await }
    });

    let loaded = videos();
    let caption = match &loaded {
        None => feed_caption(true, 0),
        Some(Ok(items)) => feed_caption(false, items.len()),
        Some(Err(_)) => feed_caption(false, 0),
    };

    rsx! {
        div { class: "card",
            div { class: "row",
                h1 { "Explore" }
                div { class: "spacer" }
                span { class: "hint", "{caption}" }
            }
            div { class: "hr" }
            match loaded {
                None => rsx! {
                    p { class: "hint", "Loading…" }
                },
                Some(Err(e)) => rsx! {
                    p { class: "error", "{e}" }
                },
                Some(Ok(items)) => rsx! {
                    div { class: "grid",
                        for v in items.clone() {
                            VideoCard { key: "{v.id}", video: v.clone() }
                        }
                    }
                    if show_empty_state(false, items.len()) {
                        p { class: "hint", "No videos yet." }
                    }
                },
            }
        }
    }
}
