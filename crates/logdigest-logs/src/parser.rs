use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use logdigest_types::{LogEntry, LogEntryRef, PodInfo};

static POD_INFO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?P<namespace>[^/]+)/)?(?:(?P<component>[^/]+)/)?pod\.(?P<pod>[^.]+?)(?:\.(?P<container>[^.]+))?\.log$",
    )
    .expect("pod info pattern is valid")
});

// ISO 8601 with milliseconds, UTC (e.g. 2024-01-15T10:30:00.123Z)
static TIMESTAMP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}\.[0-9]{3}Z")
        .expect("timestamp pattern is valid")
});

/// Derives deployment topology from bundle file paths
pub struct PodInfoParser;

impl PodInfoParser {
    /// Parse `[namespace/][component/]pod.<pod>[.<container>].log`.
    ///
    /// Never fails: paths that don't follow the layout yield an all-absent
    /// [`PodInfo`].
    pub fn parse(path: &str) -> PodInfo {
        let Some(caps) = POD_INFO_PATTERN.captures(path) else {
            return PodInfo::default();
        };
        let field = |name: &str| caps.name(name).map(|m| m.as_str().to_string());
        PodInfo {
            namespace: field("namespace"),
            component: field("component"),
            pod: field("pod"),
            container: field("container"),
        }
    }
}

/// Turns the raw lines of one file into single-occurrence log entries
pub struct EntryExtractor;

impl EntryExtractor {
    /// Build one entry per non-blank line.
    ///
    /// Messages are the whitespace-trimmed line. Line indices are zero-based
    /// over the raw lines, so blank lines still consume an index.
    pub fn extract<S: AsRef<str>>(lines: &[S], source_file: &str) -> Vec<LogEntry> {
        lines
            .iter()
            .enumerate()
            .filter_map(|(index, line)| {
                let message = line.as_ref().trim();
                if message.is_empty() {
                    return None;
                }
                let reference =
                    LogEntryRef::new(source_file, index, Self::extract_timestamp(message));
                Some(LogEntry::new(message, reference))
            })
            .collect()
    }

    /// First millisecond-precision UTC timestamp anywhere in the text
    pub fn extract_timestamp(text: &str) -> Option<DateTime<Utc>> {
        let found = TIMESTAMP_PATTERN.find(text)?;
        DateTime::parse_from_rfc3339(found.as_str())
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }
}
