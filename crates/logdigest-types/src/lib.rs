//! Shared types for logdigest
//!
//! This crate contains the data structures passed between the extraction,
//! clustering, contextualization and model-facing stages.

use std::collections::BTreeSet;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Length of the fingerprint returned by [`LogEntry::id`]
pub const ENTRY_ID_LEN: usize = 6;

// ============================================================================
// Log Entries
// ============================================================================

/// A single occurrence of a message: where and when it was seen
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogEntryRef {
    /// Source file path, relative to the bundle root
    pub file: String,

    /// Zero-based line index within the source file
    pub line: usize,

    /// First timestamp found in the line text (if any)
    pub timestamp: Option<DateTime<Utc>>,
}

impl LogEntryRef {
    pub fn new(file: impl Into<String>, line: usize, timestamp: Option<DateTime<Utc>>) -> Self {
        Self {
            file: file.into(),
            line,
            timestamp,
        }
    }
}

/// A canonical message plus every location it was seen at.
///
/// The message is fixed at construction; clustering only ever grows the
/// reference set through [`LogEntry::merge`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    message: String,
    references: BTreeSet<LogEntryRef>,
}

impl LogEntry {
    /// Create a new log entry from its first occurrence
    pub fn new(message: impl Into<String>, reference: LogEntryRef) -> Self {
        let mut references = BTreeSet::new();
        references.insert(reference);
        Self {
            message: message.into(),
            references,
        }
    }

    /// The representative message text
    pub fn message(&self) -> &str {
        &self.message
    }

    /// All occurrences, ordered by (file, line, timestamp)
    pub fn references(&self) -> &BTreeSet<LogEntryRef> {
        &self.references
    }

    /// Record another occurrence. Returns false if it was already known.
    pub fn add_ref(&mut self, reference: LogEntryRef) -> bool {
        self.references.insert(reference)
    }

    /// Absorb the references of another entry, keeping this entry's message
    pub fn merge(&mut self, other: LogEntry) {
        let mut other_refs = other.references;
        self.references.append(&mut other_refs);
    }

    /// Short, stable fingerprint of the message text (URL-safe base64 of SHA-256)
    pub fn id(&self) -> String {
        message_id(&self.message)
    }

    /// Number of distinct occurrences
    pub fn occurrences(&self) -> usize {
        self.references.len()
    }
}

/// Fingerprint a message the same way [`LogEntry::id`] does
pub fn message_id(message: &str) -> String {
    let digest = Sha256::digest(message.as_bytes());
    let mut encoded = URL_SAFE.encode(digest);
    encoded.truncate(ENTRY_ID_LEN);
    encoded
}

// ============================================================================
// Bundle Layout Types
// ============================================================================

/// Deployment topology derived from a log file path.
///
/// Every field is absent when the path does not follow the
/// `[namespace/][component/]pod.<pod>[.<container>].log` layout.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PodInfo {
    pub namespace: Option<String>,
    pub component: Option<String>,
    pub pod: Option<String>,
    pub container: Option<String>,
}

impl PodInfo {
    /// The (namespace, component) grouping key
    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            namespace: self.namespace.clone(),
            component: self.component.clone(),
        }
    }
}

/// Key used to partition entries by deployment topology
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub namespace: Option<String>,
    pub component: Option<String>,
}

// ============================================================================
// Output Types
// ============================================================================

/// One message cluster as seen from one (namespace, component) pair
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ContextGroup {
    pub message: String,
    pub namespace: Option<String>,
    pub component: Option<String>,
    pub pods: Vec<String>,
    pub occurrences: usize,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_timestamp"
    )]
    pub first_timestamp: Option<DateTime<Utc>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_timestamp"
    )]
    pub last_timestamp: Option<DateTime<Utc>>,
}

impl ContextGroup {
    pub fn new(message: String, key: &GroupKey) -> Self {
        Self {
            message,
            namespace: key.namespace.clone(),
            component: key.component.clone(),
            pods: Vec::new(),
            occurrences: 0,
            first_timestamp: None,
            last_timestamp: None,
        }
    }

    /// Widen the [first, last] window to include `ts`
    pub fn observe_timestamp(&mut self, ts: DateTime<Utc>) {
        if self.first_timestamp.is_none_or(|first| ts < first) {
            self.first_timestamp = Some(ts);
        }
        if self.last_timestamp.is_none_or(|last| ts > last) {
            self.last_timestamp = Some(ts);
        }
    }
}

/// Payload handed to the summarizer: `{"logEntries": [...]}`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ContextPayload {
    #[serde(rename = "logEntries")]
    pub log_entries: Vec<ContextGroup>,
}

impl ContextPayload {
    pub fn new(log_entries: Vec<ContextGroup>) -> Self {
        Self { log_entries }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// RFC 3339, microsecond precision, `Z` suffix
fn serialize_timestamp<S>(ts: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match ts {
        Some(ts) => {
            serializer.serialize_str(&ts.to_rfc3339_opts(chrono::SecondsFormat::Micros, true))
        }
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn ts(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, secs).unwrap()
    }

    #[test]
    fn test_id_is_stable_and_short() {
        let a = LogEntry::new("disk full", LogEntryRef::new("a.log", 0, None));
        let b = LogEntry::new("disk full", LogEntryRef::new("b.log", 7, Some(ts(1))));
        assert_eq!(a.id(), b.id());
        assert_eq!(a.id().len(), ENTRY_ID_LEN);
        assert!(
            a.id()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_ne!(a.id(), message_id("disk not full"));
    }

    #[test]
    fn test_duplicate_refs_do_not_double_count() {
        let mut entry = LogEntry::new("x", LogEntryRef::new("a.log", 1, None));
        assert!(!entry.add_ref(LogEntryRef::new("a.log", 1, None)));
        assert_eq!(entry.occurrences(), 1);
    }

    #[test]
    fn test_merge_keeps_message_and_unions_refs() {
        let mut a = LogEntry::new("first", LogEntryRef::new("a.log", 0, None));
        let b = LogEntry::new("second", LogEntryRef::new("b.log", 3, None));
        a.merge(b);
        assert_eq!(a.message(), "first");
        assert_eq!(a.occurrences(), 2);
    }

    #[test]
    fn test_merge_is_associative_for_disjoint_refs() {
        let a = LogEntry::new("m", LogEntryRef::new("a.log", 0, None));
        let b = LogEntry::new("m", LogEntryRef::new("b.log", 0, None));
        let c = LogEntry::new("m", LogEntryRef::new("c.log", 0, None));

        // A into B, then B into C
        let mut b1 = b.clone();
        b1.merge(a.clone());
        let mut c1 = c.clone();
        c1.merge(b1);

        // A and B into C in one step
        let mut c2 = c;
        c2.merge(a);
        c2.merge(b);

        assert_eq!(c1.references(), c2.references());
    }

    #[test]
    fn test_observe_timestamp_window() {
        let mut group = ContextGroup::new("m".to_string(), &GroupKey::default());
        group.observe_timestamp(ts(5));
        group.observe_timestamp(ts(1));
        group.observe_timestamp(ts(3));
        assert_eq!(group.first_timestamp, Some(ts(1)));
        assert_eq!(group.last_timestamp, Some(ts(5)));
    }

    #[test]
    fn test_payload_serialization() {
        let key = GroupKey {
            namespace: Some("ns".to_string()),
            component: None,
        };
        let mut with_ts = ContextGroup::new("boom".to_string(), &key);
        with_ts.pods.push("p1".to_string());
        with_ts.occurrences = 2;
        with_ts.observe_timestamp(ts(0));
        let without_ts = ContextGroup::new("quiet".to_string(), &key);

        let json: serde_json::Value =
            serde_json::from_str(&ContextPayload::new(vec![with_ts, without_ts]).to_json().unwrap())
                .unwrap();

        let first = &json["logEntries"][0];
        assert_eq!(first["namespace"], "ns");
        assert!(first["component"].is_null());
        assert_eq!(first["first_timestamp"], "2024-01-01T00:00:00.000000Z");
        assert_eq!(first["occurrences"], 2);

        let second = json["logEntries"][1].as_object().unwrap();
        assert!(!second.contains_key("first_timestamp"));
        assert!(!second.contains_key("last_timestamp"));
    }
}
