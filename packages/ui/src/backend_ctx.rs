use std::sync::Arc;

use api::backend::Backend;
use dioxus::prelude::*;

/// Cloneable handle to the process-wide backend client.
///
/// The client is constructed exactly once at startup and handed down
/// through context rather than a module-level singleton, so components can
/// be exercised against a substitute backend.
#[derive(Clone)]
pub struct BackendHandle(pub Arc<Backend>);

impl PartialEq for BackendHandle {
    fn eq(&self, other: &Self) -> bool {
        // Identity comparison: a handle only changes when a different
        // client instance is provided.
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Provide the backend client to the component tree. Call once, at the
/// root, after the client has been built from runtime configuration.
pub fn provide_backend(backend: Arc<Backend>) -> BackendHandle {
    use_context_provider(|| BackendHandle(backend))
}

pub fn use_backend() -> BackendHandle {
    use_context::<BackendHandle>()
}
