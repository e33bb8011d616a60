//! Two-tier conversational memory for Vitalis.
//!
//! The fast tier is a bounded [`MemoryWindow`] of recent turns; the slow
//! tier is a semantic archive of [`MemorySummary`] digests recalled by
//! embedding similarity.

pub mod error;
pub mod model;
pub mod recall;
pub mod store;
pub mod summarize;
pub mod window;

/// Memory error type.
pub use error::MemoryError;
/// Summary record model.
pub use model::MemorySummary;
/// Similarity scoring and recall options.
pub use recall::{RecallOptions, cosine_similarity};
/// Summary store interface and default file implementation.
pub use store::{FileSummaryStore, SummaryStore};
/// Cadence summarizer with retry.
pub use summarize::{Summarizer, SummarizerOptions};
/// Bounded recent-turn window.
pub use window::MemoryWindow;
