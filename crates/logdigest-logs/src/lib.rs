//! Log processing for logdigest
//!
//! This crate turns the files of a log bundle into a small set of distinct,
//! traceable message clusters: line extraction, fuzzy clustering within and
//! across files, failure filtering and namespace/component contextualization.

mod cluster;
mod context;
mod filter;
mod parser;
mod pipeline;
mod similarity;

pub use cluster::{FuzzyClusterer, cluster};
pub use context::Contextualizer;
pub use filter::{DEFAULT_BATCH_SIZE, ErrorFilter};
pub use parser::{EntryExtractor, PodInfoParser};
pub use pipeline::{DEFAULT_THRESHOLD, DigestReport, Pipeline, PipelineOptions};
pub use similarity::{ratio, ratio_with_cutoff};

// Re-export types used in our public API
pub use logdigest_types::{ContextGroup, ContextPayload, LogEntry, LogEntryRef, PodInfo};

use logdigest_llm::LlmError;
use logdigest_source::SourceError;

/// Errors that end a digest run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("model collaborator failed")]
    Collaborator(#[source] LlmError),

    #[error("no classification batch succeeded ({failed} batches returned unusable responses)")]
    NoBatchSucceeded { failed: usize },
}
