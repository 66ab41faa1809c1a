use api::backend::UploadSource;
use api::uploads::{perform_upload, UploadForm};
use dioxus::html::HasFileData;
use dioxus::prelude::*;
use ui::{redirect_replace, use_backend, use_user, RequireAuth};

#[component]
pub fn Upload() -> Element {
    rsx! {
        RequireAuth {
            UploadInner {}
        }
    }
}

#[component]
fn UploadInner() -> Element {
    let backend = use_backend();
    let state = use_user();

    let mut file = use_signal(|| None::<UploadSource>);
    let mut title = use_signal(String::new);
    let mut description = use_signal(String::new);
    let mut progress = use_signal(|| 0.0f64);
    let mut busy = use_signal(|| false);
    let mut error = use_signal(|| None::<String>);

    // Defense in depth: the resolver already signs banned accounts out, but
    // a banned profile that still renders here goes home instead.
    use_effect(move || {
        let s = state();
        if !s.loading && s.profile.as_ref().is_some_and(|p| p.banned) {
            redirect_replace("/");
        }
    });

    let pct_label = format!("{:.2}%", progress());
    let fill_style = format!("width: {:.2}%", progress());

    rsx! {
        div { class: "card narrow",
            div { class: "row",
                h1 { "Upload" }
                div { class: "spacer" }
                Link { class: "btn", to: crate::Route::Home {}, "← Back" }
            }
            div { class: "hr" }
            div { class: "field",
                label { "Video file" }
                input {
                    class: "input",
                    r#type: "file",
                    accept: "video/*",
                    onchange: move |evt| {
                        spawn(async move {
                            let files = evt.files();
                            if let Some(file_data) = files.first() {
                                let name = file_data.name();
                                if let Ok(bytes) = file_data.read_bytes().await {
                                    let content_type = mime_guess::from_path(&name)
                                        .first_or_octet_stream()
                                        .to_string();
                                    file.set(Some(UploadSource {
                                        file_name: name,
                                        content_type,
                                        bytes: bytes.to_vec(),
                                    }));
                                }
                            }
                        });
                    },
                }
            }
            div { class: "field",
                label { "Title" }
                input {
                    class: "input",
                    value: "{title}",
                    placeholder: "My video title",
                    oninput: move |e| title.set(e.value()),
                }
            }
            div { class: "field",
                label { "Description" }
                textarea {
                    class: "input",
                    value: "{description}",
                    placeholder: "What is this video about?",
                    oninput: move |e| description.set(e.value()),
                }
            }
            if busy() {
                div { class: "card",
                    div { class: "row",
                        strong { "Uploading…" }
                        div { class: "spacer" }
                        span { class: "hint", "{pct_label}" }
                    }
                    div { class: "progress_track",
                        div { class: "progress_fill", style: "{fill_style}" }
                    }
                }
            }
            if let Some(err) = error() {
                p { class: "error", "{err}" }
            }
            button {
                class: "btn primary wide",
                disabled: busy(),
                onclick: move |_| {
                    let backend = backend.clone();
                    error.set(None);
                    busy.set(true);
                    progress.set(0.0);
                    spawn(async move {
                        let snapshot = state();
                        let form = UploadForm {
                            title: title(),
                            description: description(),
                        };
                        let source = file();
                        let result = perform_upload(
                                backend.0.auth.as_ref(),
                                backend.0.uploader.as_ref(),
                                backend.0.videos.as_ref(),
                                snapshot.user.as_ref(),
                                source.as_ref(),
                                &form,
                                &mut |pct| progress.set(pct),
                            )
                            .await;
                        match result {
                            Ok(()) => {
                                let _ = document::eval("window.location.assign(\"/\")").await;
                            }
                            Err(e) => {
                                busy.set(false);
                                error.set(Some(e.to_string()));
                            }
                        }
                    });
                },
                if busy() { "Uploading…" } else { "Upload video" }
            }
            p { class: "hint",
                "Uploads go straight from your browser to object storage; an interrupted transfer resumes where it stopped."
            }
        }
    }
}
