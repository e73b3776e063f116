use std::collections::{HashMap, HashSet};

use logdigest_llm::{ClassificationRequest, ClassificationResponse, Classifier};
use logdigest_types::LogEntry;

use crate::PipelineError;

/// Entries submitted per classification request
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Pages deduplicated entries through a [`Classifier`] and keeps the failures
#[derive(Clone, Copy, Debug)]
pub struct ErrorFilter {
    batch_size: usize,
}

impl Default for ErrorFilter {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl ErrorFilter {
    /// Create a filter; a zero batch size is treated as one
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Return the entries the classifier judged to be failures.
    ///
    /// Results are concatenated in batch order; within a batch they follow the
    /// classifier's order. A batch whose reply is unusable is skipped with a
    /// warning, and the run only fails if every batch was skipped. Transport
    /// and authentication failures end the run immediately.
    pub async fn filter_errors(
        &self,
        classifier: &dyn Classifier,
        entries: &[LogEntry],
    ) -> Result<Vec<LogEntry>, PipelineError> {
        let mut filtered = Vec::new();
        let mut failed_batches = 0;
        let mut succeeded_batches = 0;

        for (batch, chunk) in entries.chunks(self.batch_size).enumerate() {
            let request = ClassificationRequest::from_entries(chunk);
            tracing::debug!(batch, size = request.len(), "classifying batch");

            let response = classifier
                .classify(&request)
                .await
                .and_then(ClassificationResponse::from_value);

            match response {
                Ok(response) => {
                    succeeded_batches += 1;
                    filtered.extend(resolve_failures(batch, chunk, &response));
                }
                Err(e) if e.is_recoverable() => {
                    failed_batches += 1;
                    tracing::warn!(batch, error = %e, "skipping batch with unusable classifier response");
                }
                Err(e) => return Err(PipelineError::Collaborator(e)),
            }
        }

        if succeeded_batches == 0 && failed_batches > 0 {
            return Err(PipelineError::NoBatchSucceeded {
                failed: failed_batches,
            });
        }

        tracing::info!(
            entries = entries.len(),
            failures = filtered.len(),
            skipped_batches = failed_batches,
            "classification finished"
        );
        Ok(filtered)
    }
}

/// Map returned ids back onto the batch's entries
fn resolve_failures(
    batch: usize,
    chunk: &[LogEntry],
    response: &ClassificationResponse,
) -> Vec<LogEntry> {
    let lookup: HashMap<String, &LogEntry> =
        chunk.iter().map(|entry| (entry.id(), entry)).collect();
    let mut seen = HashSet::new();
    let mut resolved = Vec::new();

    for id in &response.failures {
        let Some(entry) = lookup.get(id) else {
            tracing::warn!(batch, id = %id, "classifier returned an id that was not submitted");
            continue;
        };
        if seen.insert(id.as_str()) {
            resolved.push((*entry).clone());
        }
    }

    resolved
}
