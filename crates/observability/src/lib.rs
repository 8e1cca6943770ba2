//! Process-wide logging setup shared by the clinic binaries.

/// Install the tracing subscriber. Later calls are no-ops.
pub fn init() {
    tracing::init();
}

pub mod tracing;
