use api::backend::AuthApi;
use dioxus::prelude::*;
use ui::use_backend;

#[component]
pub fn Login() -> Element {
    let backend = use_backend();
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut error = use_signal(|| None::<String>);
    let mut busy = use_signal(|| false);

    rsx! {
        div { class: "card narrow",
            h1 { "Log in" }
            p { class: "hint",
                "Don't have an account? "
                Link { to: crate::Route::Signup {}, "Sign up" }
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
                    placeholder: "••••••••",
                    oninput: move |e| password.set(e.value()),
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
                    busy.set(true);
                    error.set(None);
                    spawn(async move {
                        match backend.0.auth.sign_in(&email(), &password()).await {
                            Ok(_) => {
                                let _ = document::eval("window.location.assign(\"/\")").await;
                            }
                            Err(e) => {
                                busy.set(false);
                                error.set(Some(e.to_string()));
                            }
                        }
                    });
                },
                if busy() { "Signing in…" } else { "Sign in" }
            }
        }
    }
}
