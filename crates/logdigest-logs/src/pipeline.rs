use logdigest_llm::{Classifier, Summarizer};
use logdigest_source::FileSource;
use logdigest_types::{ContextPayload, LogEntry};

use crate::PipelineError;
use crate::cluster::FuzzyClusterer;
use crate::context::Contextualizer;
use crate::filter::{DEFAULT_BATCH_SIZE, ErrorFilter};
use crate::parser::{EntryExtractor, PodInfoParser};

/// Default similarity threshold for both clustering passes
pub const DEFAULT_THRESHOLD: f64 = 70.0;

/// Tunables for a digest run
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineOptions {
    /// Similarity score in `[0, 100]` needed to join a cluster
    pub threshold: f64,

    /// Entries per classification request
    pub batch_size: usize,

    /// Only process files under this top-level directory (case-insensitive)
    pub namespace: Option<String>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            batch_size: DEFAULT_BATCH_SIZE,
            namespace: None,
        }
    }
}

/// Outcome of a digest run
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DigestReport {
    pub files_processed: usize,
    pub files_skipped: usize,
    pub entries_extracted: usize,

    /// Distinct messages after both clustering passes
    pub clusters: usize,

    /// Clusters the classifier judged to be failures (None if not classified)
    pub failures: Option<usize>,

    pub payload: ContextPayload,

    /// Failure messages whose files all sit outside the pod layout, so they
    /// belong to no context group
    pub ungrouped: Vec<String>,

    /// Model-written summary (None if no model was asked)
    pub summary: Option<String>,
}

/// Drives extraction, clustering, filtering and contextualization over one bundle
pub struct Pipeline<'a> {
    source: &'a dyn FileSource,
    options: PipelineOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(source: &'a dyn FileSource, options: PipelineOptions) -> Self {
        Self { source, options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Whether a bundle path should be processed
    pub fn is_log_path(&self, path: &str) -> bool {
        let lower = path.to_lowercase();
        if !lower.ends_with(".log") {
            return false;
        }
        match &self.options.namespace {
            Some(namespace) => lower.starts_with(&format!("{}/", namespace.to_lowercase())),
            None => true,
        }
    }

    /// Extract and cluster every log file: first within each file, then
    /// across the per-file representatives.
    pub fn deduplicate(&self) -> Result<(Vec<LogEntry>, DigestReport), PipelineError> {
        let clusterer = FuzzyClusterer::new(self.options.threshold);
        let mut report = DigestReport::default();
        let mut representatives = Vec::new();

        for file in self.source.list_files()? {
            if !self.is_log_path(&file) {
                tracing::debug!(file = %file, "skipping file");
                report.files_skipped += 1;
                continue;
            }

            let lines = self.source.read_file(&file)?;
            let entries = EntryExtractor::extract(&lines, &file);
            let extracted = entries.len();
            let clustered = clusterer.cluster(entries);
            tracing::debug!(
                file = %file,
                lines = extracted,
                clusters = clustered.len(),
                "clustered file"
            );

            report.files_processed += 1;
            report.entries_extracted += extracted;
            representatives.extend(clustered);
        }

        if report.files_processed == 0 && report.files_skipped > 0 {
            tracing::warn!(
                source = %self.source.describe(),
                skipped = report.files_skipped,
                "no file in the bundle matched the log selection"
            );
        }

        let merged = clusterer.cluster(representatives);
        report.clusters = merged.len();
        tracing::info!(
            source = %self.source.describe(),
            files = report.files_processed,
            skipped = report.files_skipped,
            entries = report.entries_extracted,
            clusters = report.clusters,
            "deduplicated bundle"
        );

        Ok((merged, report))
    }

    /// Deduplicate and contextualize every cluster, without calling any model
    pub fn digest(&self) -> Result<DigestReport, PipelineError> {
        let (entries, mut report) = self.deduplicate()?;
        report.payload = ContextPayload::new(Contextualizer::new().contextualize(&entries));
        Ok(report)
    }

    /// Full run: deduplicate, keep failures, contextualize, summarize
    pub async fn run(
        &self,
        classifier: &dyn Classifier,
        summarizer: &dyn Summarizer,
    ) -> Result<DigestReport, PipelineError> {
        let (entries, mut report) = self.deduplicate()?;

        let failures = ErrorFilter::new(self.options.batch_size)
            .filter_errors(classifier, &entries)
            .await?;
        report.failures = Some(failures.len());
        if failures.is_empty() {
            tracing::info!("no failures to summarize");
            return Ok(report);
        }

        report.payload = ContextPayload::new(Contextualizer::new().contextualize(&failures));
        report.ungrouped = failures
            .iter()
            .filter(|entry| !has_pod_reference(entry))
            .map(|entry| entry.message().to_string())
            .collect();
        if !report.ungrouped.is_empty() {
            tracing::warn!(
                count = report.ungrouped.len(),
                "failures found in files outside the pod log layout"
            );
        }

        if report.payload.log_entries.is_empty() {
            tracing::warn!("no failure maps to a namespace/component group; skipping summary");
            return Ok(report);
        }

        let summary = summarizer
            .summarize(&report.payload)
            .await
            .map_err(PipelineError::Collaborator)?;
        report.summary = Some(summary);
        Ok(report)
    }
}

/// Whether any reference of `entry` points into a pod log file
fn has_pod_reference(entry: &LogEntry) -> bool {
    entry
        .references()
        .iter()
        .any(|reference| PodInfoParser::parse(&reference.file).pod.is_some())
}
