//! Test helpers shared across Vitalis crates.

pub mod embed;
pub mod generate;
pub mod knowledge;

pub use embed::{FailingEmbedder, StubEmbedder};
pub use generate::{FailingGenerator, FixedGenerator, RecordingGenerator, ScriptedGenerator};
pub use knowledge::{RecordingKnowledge, StubKnowledge};
