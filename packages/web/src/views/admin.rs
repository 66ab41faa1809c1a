use api::types::{Profile, Role, Video};
use dioxus::prelude::*;
use ui::{format_timestamp, use_backend, RequireAdmin};
use uuid::Uuid;

#[component]
pub fn Admin() -> Element {
    rsx! {
        RequireAdmin {
            Console {}
        }
    }
}

#[component]
fn Console() -> Element {
    let backend = use_backend();
    let error = use_signal(|| None::<String>);
    // One busy flag per row id: only that row's buttons lock while its
    // mutation is in flight. The backend is the only serialization point
    // against other admin sessions.
    let busy_id = use_signal(|| None::<Uuid>);

    let console_backend = backend.clone();
    let mut console = use_resource(move || {
        let backend = console_backend.clone();
        async move {
            api::admin::load_console(backend.0.profiles.as_ref(), backend.0.videos.as_ref()).await
        }
    });

    rsx! {
        div { class: "card",
            div { class: "row",
                h1 { "Admin" }
                div { class: "spacer" }
                Link { class: "btn", to: crate::Route::Home {}, "← Back" }
            }
            if let Some(err) = error() {
                p { class: "error", "{err}" }
            }
            div { class: "hr" }
            match console() {
                None => rsx! {
                    p { class: "hint", "Loading…" }
                },
                Some(Err(e)) => rsx! {
                    p { class: "error", "{e}" }
                },
                Some(Ok(data)) => rsx! {
                    div { class: "row baseline",
                        h2 { "Users" }
                        div { class: "spacer" }
                        span { class: "hint", "{data.profiles.len()}" }
                    }
                    table { class: "table",
                        thead {
                            tr {
                                th { "User ID" }
                                th { "Role" }
                                th { "Banned" }
                                th { "Actions" }
                            }
                        }
                        tbody {
                            for p in data.profiles.clone() {
                                ProfileRow {
                                    key: "{p.id}",
                                    profile: p.clone(),
                                    busy_id: busy_id,
                                    error: error,
                                    refresh: move |_| console.restart(),
                                }
                            }
                        }
                    }
                    div { class: "hr" }
                    div { class: "row baseline",
                        h2 { "Videos" }
                        div { class: "spacer" }
                        span { class: "hint", "{data.videos.len()}" }
                    }
                    table { class: "table",
                        thead {
                            tr {
                                th { "Title" }
                                th { "Owner" }
                                th { "Created" }
                                th { "Actions" }
                            }
                        }
                        tbody {
                            for v in data.videos.clone() {
                                VideoRow {
                                    key: "{v.id}",
                                    video: v.clone(),
                                    busy_id: busy_id,
                                    error: error,
                                    refresh: move |_| console.restart(),
                                }
                            }
                        }
                    }
                    p { class: "hint",
                        "Moderation is enforced by the backend's row-level security policies; these controls are a window onto them."
                    }
                },
            }
        }
    }
}

#[component]
fn ProfileRow(
    profile: Profile,
    mut busy_id: Signal<Option<Uuid>>,
    mut error: Signal<Option<String>>,
    refresh: EventHandler<()>,
) -> Element {
    let backend = use_backend();
    let busy = busy_id() == Some(profile.id);
    let role_label = if profile.role == Role::Admin {
        "Make user"
    } else {
        "Make admin"
    };
    let ban_label = if profile.banned { "Unban" } else { "Ban" };

    let role_backend = backend.clone();
    let role_profile = profile.clone();
    let ban_backend = backend.clone();
    let ban_profile = profile.clone();

    rsx! {
        tr {
            td { code { "{profile.id}" } }
            td {
                span { class: "badge", {profile.role.as_db()} }
            }
            td {
                if profile.banned {
                    span { class: "badge danger", "banned" }
                } else {
                    span { class: "badge", "ok" }
                }
            }
            td {
                div { class: "row",
                    button {
                        class: "btn",
                        disabled: busy,
                        onclick: move |_| {
                            let backend = role_backend.clone();
                            let profile = role_profile.clone();
                            busy_id.set(Some(profile.id));
                            error.set(None);
                            spawn(async move {
                                let res = api::admin::toggle_role(backend.0.profiles.as_ref(), &profile)
                                    .await;
                                busy_id.set(None);
                                match res {
                                    Ok(()) => refresh.call(()),
                                    Err(e) => error.set(Some(e.to_string())),
                                }
                            });
                        },
                        "{role_label}"
                    }
                    button {
                        class: "btn danger",
                        disabled: busy,
                        onclick: move |_| {
                            let backend = ban_backend.clone();
                            let profile = ban_profile.clone();
                            busy_id.set(Some(profile.id));
                            error.set(None);
                            spawn(async move {
                                let res = api::admin::toggle_ban(backend.0.profiles.as_ref(), &profile)
                                    .await;
                                busy_id.set(None);
                                match res {
                                    Ok(()) => refresh.call(()),
                                    Err(e) => error.set(Some(e.to_string())),
                                }
                            });
                        },
                        "{ban_label}"
                    }
                }
            }
        }
    }
}

#[component]
fn VideoRow(
    video: Video,
    mut busy_id: Signal<Option<Uuid>>,
    mut error: Signal<Option<String>>,
    refresh: EventHandler<()>,
) -> Element {
    let backend = use_backend();
    let busy = busy_id() == Some(video.id);
    let delete_backend = backend.clone();
    let delete_video = video.clone();

    rsx! {
        tr {
            td { "{video.title}" }
            td { code { "{video.user_id}" } }
            td {
                span { class: "hint", {format_timestamp(&video.created_at)} }
            }
            td {
                button {
                    class: "btn danger",
                    disabled: busy,
                    onclick: move |_| {
                        let backend = delete_backend.clone();
                        let video = delete_video.clone();
                        busy_id.set(Some(video.id));
                        error.set(None);
                        spawn(async move {
                            let res = api::admin::delete_video(
                                    backend.0.objects.as_ref(),
                                    backend.0.videos.as_ref(),
                                    &video,
                                )
                                .await;
                            busy_id.set(None);
                            match res {
                                Ok(()) => refresh.call(()),
                                Err(e) => error.set(Some(e.to_string())),
                            }
                        });
                    },
                    "Delete"
                }
            }
        }
    }
}
