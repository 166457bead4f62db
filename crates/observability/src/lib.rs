//! Process-wide tracing setup shared by the binary and tests.

/// Initialize tracing with the format chosen by `LOG_FORMAT` (default JSON).
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

/// Tracing configuration (filters, output format).
pub mod tracing;
