use api::backend::ObjectStore;
use api::types::Video;
use dioxus::prelude::*;

use crate::backend_ctx::use_backend;
use crate::format::format_timestamp;

/// One tile of the explore grid, linking to the watch page. The thumbnail
/// streams straight from the object's public URL.
#[component]
pub fn VideoCard(video: Video) -> Element {
    let backend = use_backend();
    let url = backend.0.objects.public_url(&video.storage_path);
    let watch = format!("/watch/{}", video.id);

    rsx! {
        a { class: "card video_card", href: "{watch}",
            div { class: "video_thumb",
                video { src: "{url}", muted: true, preload: "metadata" }
            }
            div { class: "video_card_body",
                div { class: "video_title", "{video.title}" }
                div { class: "hint", {format_timestamp(&video.created_at)} }
            }
        }
    }
}
