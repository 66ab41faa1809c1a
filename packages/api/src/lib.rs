//! Backend client, domain types, and the orchestration every view in the
//! workspace shares. Nothing in here renders, and nothing in here is a
//! security boundary: the backend platform's row-level-security policies
//! are the authoritative gate for every read and mutation.
use dioxus::prelude::*;

pub mod config;
pub mod error;
pub mod types;

pub mod backend;

pub mod admin;
pub mod session;
pub mod uploads;
pub mod videos;

#[cfg(test)]
mod test_support;

/// Health check endpoint
#[get("/api/health")]
pub async fn health_check() -> Result<String, ServerFnError> {
    #[cfg(feature = "server")]
    tracing::debug!("health_check");
    Ok("OK".to_string())
}

/// Runtime configuration the browser needs before it can build its backend
/// client. Read from the server's environment, never compiled in.
#[get("/api/config")]
pub async fn public_config() -> Result<config::PublicConfig, ServerFnError> {
    #[cfg(feature = "server")]
    tracing::debug!("public_config");
    config::public_config().await
}
