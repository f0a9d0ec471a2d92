//! Logging utilities

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system from `RUST_LOG`
///
/// Safe to call more than once; later calls are ignored.
pub fn init() {
    if env_logger::try_init().is_err() {
        log::trace!("Logger already initialized");
    }
}

/// Initialize the logging system with an explicit filter (e.g. `"info"` or `"umbra_engine=debug"`)
///
/// `RUST_LOG` still takes precedence when it is set.
pub fn init_with_level(filter: &str) {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(filter);
    if let Ok(env_filter) = std::env::var("RUST_LOG") {
        builder.parse_filters(&env_filter);
    }
    if builder.try_init().is_err() {
        log::trace!("Logger already initialized");
    }
}
