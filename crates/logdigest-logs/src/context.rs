use std::collections::HashMap;

use logdigest_types::{ContextGroup, GroupKey, LogEntry, PodInfo};

use crate::parser::PodInfoParser;

/// Re-partitions clustered entries by (namespace, component).
///
/// An entry is broadcast into every group its references touch; within a
/// group only the references belonging to that group are counted. References
/// to files outside the pod layout carry no topology and are left out.
#[derive(Default)]
pub struct Contextualizer {
    /// Parsed paths, keyed by file
    pod_info: HashMap<String, PodInfo>,
}

impl Contextualizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one [`ContextGroup`] per (entry, namespace, component).
    ///
    /// Groups come out in first-seen key order, and entries within a key in
    /// input order.
    pub fn contextualize(&mut self, entries: &[LogEntry]) -> Vec<ContextGroup> {
        let mut keys: Vec<GroupKey> = Vec::new();
        let mut members: HashMap<GroupKey, Vec<usize>> = HashMap::new();

        for (index, entry) in entries.iter().enumerate() {
            for reference in entry.references() {
                let Some(key) = self.key_for(&reference.file) else {
                    continue;
                };
                let group = members.entry(key.clone()).or_insert_with(|| {
                    keys.push(key);
                    Vec::new()
                });
                if group.last() != Some(&index) {
                    group.push(index);
                }
            }
        }

        let mut results = Vec::new();
        for key in &keys {
            for &index in &members[key] {
                results.push(self.summarize_entry(&entries[index], key));
            }
        }
        results
    }

    /// Aggregate the references of one entry that fall under `key`
    fn summarize_entry(&mut self, entry: &LogEntry, key: &GroupKey) -> ContextGroup {
        let mut group = ContextGroup::new(entry.message().to_string(), key);

        for reference in entry.references() {
            let info = self.pod_info(&reference.file);
            let Some(pod) = info.pod.as_deref() else {
                continue;
            };
            if info.namespace != key.namespace || info.component != key.component {
                continue;
            }

            group.occurrences += 1;
            if !group.pods.iter().any(|p| p == pod) {
                group.pods.push(pod.to_string());
            }
            if let Some(ts) = reference.timestamp {
                group.observe_timestamp(ts);
            }
        }

        group
    }

    /// Group key for a file, or None if the path is outside the pod layout
    fn key_for(&mut self, file: &str) -> Option<GroupKey> {
        let info = self.pod_info(file);
        info.pod.as_ref()?;
        Some(info.group_key())
    }

    fn pod_info(&mut self, file: &str) -> &PodInfo {
        if !self.pod_info.contains_key(file) {
            self.pod_info
                .insert(file.to_string(), PodInfoParser::parse(file));
        }
        &self.pod_info[file]
    }
}
