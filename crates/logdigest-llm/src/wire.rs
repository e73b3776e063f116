use serde::{Deserialize, Serialize};

use logdigest_types::LogEntry;

use crate::LlmError;

/// One message submitted for classification
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageIdEntry {
    pub message: String,
    #[serde(rename = "messageID")]
    pub message_id: String,
}

impl From<&LogEntry> for MessageIdEntry {
    fn from(entry: &LogEntry) -> Self {
        Self {
            message: entry.message().to_string(),
            message_id: entry.id(),
        }
    }
}

/// `{"logEntries": [{"message", "messageID"}, ...]}`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationRequest {
    #[serde(rename = "logEntries")]
    pub log_entries: Vec<MessageIdEntry>,
}

impl ClassificationRequest {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a LogEntry>) -> Self {
        Self {
            log_entries: entries.into_iter().map(MessageIdEntry::from).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.log_entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log_entries.is_empty()
    }
}

/// Validated classifier reply. Fields other than `failures` are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ClassificationResponse {
    pub failures: Vec<String>,
}

impl ClassificationResponse {
    /// Check the shape of an untrusted reply
    pub fn from_value(value: serde_json::Value) -> Result<Self, LlmError> {
        if !value.is_object() {
            return Err(LlmError::MalformedResponse(format!(
                "expected a JSON object, got {}",
                value
            )));
        }
        if value.get("failures").is_none() {
            return Err(LlmError::MalformedResponse(
                "missing required field `failures`".to_string(),
            ));
        }
        serde_json::from_value(value).map_err(|e| LlmError::MalformedResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logdigest_types::LogEntryRef;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_request_wire_format() {
        let entry = LogEntry::new("ERROR disk full", LogEntryRef::new("a.log", 0, None));
        let request = ClassificationRequest::from_entries([&entry]);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({"logEntries": [{"message": "ERROR disk full", "messageID": entry.id()}]})
        );
    }

    #[test]
    fn test_response_ignores_extra_fields() {
        let response =
            ClassificationResponse::from_value(json!({"failures": ["abc123"], "reason": "x"}))
                .unwrap();
        assert_eq!(response.failures, vec!["abc123".to_string()]);
    }

    #[test]
    fn test_response_missing_failures() {
        let err = ClassificationResponse::from_value(json!({"errors": []})).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_response_wrong_types() {
        assert!(ClassificationResponse::from_value(json!({"failures": "abc"})).is_err());
        assert!(ClassificationResponse::from_value(json!({"failures": [1, 2]})).is_err());
        assert!(ClassificationResponse::from_value(json!(["abc"])).is_err());
    }
}
