use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Display format for entry and exit timestamps, in server-local time.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorRecord {
    pub id: String,
    pub name: String,
    pub purpose: String,
    pub entry_time: String,
    #[serde(default)]
    pub exit_time: Option<String>,
}

impl VisitorRecord {
    pub fn new(name: String, purpose: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            purpose,
            entry_time: timestamp(),
            exit_time: None,
        }
    }

    pub fn has_exited(&self) -> bool {
        self.exit_time.is_some()
    }

    fn is_well_formed(&self) -> bool {
        !self.id.is_empty() && !self.name.trim().is_empty() && !self.purpose.trim().is_empty()
    }
}

pub fn timestamp() -> String {
    Local::now().format(TIME_FORMAT).to_string()
}

pub fn encode_visitors(visitors: &[VisitorRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string(visitors)
}

/// Decode a stored visitor list.
///
/// A payload that is not a JSON array decodes to an empty list. Elements that
/// don't have the expected shape, have an empty name or purpose, or repeat an
/// earlier id are dropped; the rest keep their order. An empty exit time is
/// read as absent.
pub fn decode_visitors(raw: &str) -> Vec<VisitorRecord> {
    let values: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!("Discarding malformed visitor payload: {e}");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut visitors = Vec::with_capacity(values.len());

    for (index, value) in values.into_iter().enumerate() {
        let mut record: VisitorRecord = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Dropping stored visitor at index {index}: {e}");
                continue;
            }
        };

        // Older payloads may carry an empty exit time for a visitor still inside
        if record.exit_time.as_deref().is_some_and(|t| t.trim().is_empty()) {
            record.exit_time = None;
        }

        if !record.is_well_formed() {
            tracing::warn!("Dropping stored visitor at index {index}: empty field");
            continue;
        }

        if !seen.insert(record.id.clone()) {
            tracing::warn!("Dropping stored visitor at index {index}: duplicate id {}", record.id);
            continue;
        }

        visitors.push(record);
    }

    visitors
}
