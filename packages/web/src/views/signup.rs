use api::backend::AuthApi;
use dioxus::prelude::*;
use ui::use_backend;

#[component]
pub fn Signup() -> Element {
    let backend = use_backend();
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut message = use_signal(|| None::<String>);
    let mut error = use_signal(|| None::<String>);
    let mut busy = use_signal(|| false);

    rsx! {
        div { class: "card narrow",
            h1 { "Sign up" }
            p { class: "hint",
                "Already have an account? "
                Link { to: crate::Route::Login {}, "Log in" }
            }
            div { class: "field",
                label { "Email" }
                input {
                    class: "input",
                    value: "{email}",
                    placeholder: "you@example.com",
                    oninput: move |e| email.set(e.value()),
                }
            }
            div { class: "field",
                label { "Password" }
                input {
                    class: "input",
                    r#type: "password",
                    value: "{password}",
                    placeholder: "Use a strong password",
                    oninput: move |e| password.set(e.value()),
                }
            }
            if let Some(err) = error() {
                p { class: "error", "{err}" }
            }
            if let Some(msg) = message() {
                p { class: "notice", "{msg}" }
            }
            button {
                class: "btn primary wide",
                disabled: busy(),
                onclick: move |_| {
                    let backend = backend.clone();
                    busy.set(true);
                    error.set(None);
                    message.set(None);
                    spawn(async move {
                        match backend.0.auth.sign_up(&email(), &password()).await {
                            Ok(()) => {
                                message
                                    .set(Some(
                                        "Check your email for a confirmation link, then log in."
                                            .to_string(),
                                    ));
                            }
                            Err(e) => error.set(Some(e.to_string())),
                        }
                        busy.set(false);
                    });
                },
                if busy() { "Creating account…" } else { "Create account" }
            }
        }
    }
}
