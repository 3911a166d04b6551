//! Integration test suite driving the public library surface.

use std::sync::Once;

mod interceptors;
mod rendering;

static INIT: Once = Once::new();

/// Installs a tracing subscriber once so `RUST_LOG` works for test runs.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}
