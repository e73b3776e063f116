use logdigest_types::LogEntry;

use crate::similarity::char_ratio;

/// Greedy, order-preserving clustering of log entries by message similarity.
///
/// Each cluster is represented by the message of the entry that founded it.
/// An entry joins the *first* cluster (in creation order) whose representative
/// scores at least `threshold` against it; otherwise it founds a new cluster.
/// Representatives never change, so a cluster can drift: members only need to
/// be close to the founder, not to each other.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FuzzyClusterer {
    threshold: f64,
}

impl FuzzyClusterer {
    /// Create a clusterer; `threshold` is clamped to `[0, 100]` and NaN is
    /// treated as 100 (only exact duplicates merge)
    pub fn new(threshold: f64) -> Self {
        let threshold = if threshold.is_nan() { 100.0 } else { threshold };
        Self {
            threshold: threshold.clamp(0.0, 100.0),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Cluster `entries`, merging each into its cluster's accumulated entry.
    ///
    /// Output order is cluster creation order. Comparisons are O(n * k) for
    /// k clusters formed.
    pub fn cluster(&self, entries: impl IntoIterator<Item = LogEntry>) -> Vec<LogEntry> {
        let mut clusters: Vec<LogEntry> = Vec::new();
        // Decoded representatives, parallel to `clusters`
        let mut representatives: Vec<Vec<char>> = Vec::new();

        for entry in entries {
            let message: Vec<char> = entry.message().chars().collect();
            let matched = representatives
                .iter()
                .position(|rep| char_ratio(&message, rep, self.threshold) >= self.threshold);

            match matched {
                Some(index) => clusters[index].merge(entry),
                None => {
                    representatives.push(message);
                    clusters.push(entry);
                }
            }
        }

        clusters
    }
}

/// Cluster `entries` with a one-off [`FuzzyClusterer`]
pub fn cluster(entries: impl IntoIterator<Item = LogEntry>, threshold: f64) -> Vec<LogEntry> {
    FuzzyClusterer::new(threshold).cluster(entries)
}
