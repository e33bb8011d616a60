//! Public SDK surface for Vitalis.
//!
//! This crate re-exports the core building blocks and provides a small
//! initialization helper to keep consumer setup consistent.

/// Re-export for convenience.
pub use vitalis_config as config;
pub use vitalis_core as core;
/// Re-export for convenience.
pub use vitalis_knowledge as knowledge;
/// Re-export for convenience.
pub use vitalis_memory as memory;
/// Re-export for convenience.
pub use vitalis_protocol as protocol;

#[inline]
/// Initialize logging using env_logger.
///
/// Safe to call more than once; only the first call wins. Embedding
/// applications are still expected to call this early in startup so log
/// output is wired up.
pub fn init_logging() {
    let _ = env_logger::try_init();
}
