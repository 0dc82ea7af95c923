// src/health/report.rs
use super::component::Component;
use super::status::Status;
use serde::Serialize;
use std::collections::BTreeMap;

/// Metadata key holding the persistent service identifier.
pub const SERVICE_ID_KEY: &str = "service_id";

/// The externally visible result of an aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HealthzReport {
    pub status: Status,
    pub metadata: BTreeMap<String, String>,
    pub notes: Vec<String>,
    pub details: BTreeMap<String, Component>,
}

impl HealthzReport {
    /// Metadata lookup; a missing key yields an empty string.
    pub fn get(&self, key: &str) -> &str {
        self.metadata.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Keep the first `max` notes and return how many were dropped.
    pub(crate) fn truncate_notes(&mut self, max: usize) -> usize {
        let dropped = self.notes.len().saturating_sub(max);
        self.notes.truncate(max);
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_metadata_key_is_empty() {
        let report = HealthzReport::default();
        assert_eq!(report.get("nope"), "");
    }

    #[test]
    fn metadata_keys_are_case_sensitive() {
        let mut report = HealthzReport::default();
        report.set("Region", "eu");
        report.set("region", "us");
        assert_eq!(report.get("Region"), "eu");
        assert_eq!(report.get("region"), "us");
        assert_eq!(report.get("REGION"), "");
    }

    #[test]
    fn truncation_keeps_prefix() {
        let mut report = HealthzReport::default();
        report.notes = (0..5).map(|i| format!("note {i}")).collect();

        assert_eq!(report.truncate_notes(3), 2);
        assert_eq!(report.notes, vec!["note 0", "note 1", "note 2"]);
        assert_eq!(report.truncate_notes(10), 0);
    }

    #[test]
    fn serializes_wire_shape() {
        let mut report = HealthzReport::default();
        report.set(SERVICE_ID_KEY, "api123");
        report.notes.push("db pass".into());
        report
            .details
            .insert("db".into(), Component::new("database", "db"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "pass");
        assert_eq!(json["metadata"]["service_id"], "api123");
        assert_eq!(json["notes"][0], "db pass");
        assert_eq!(json["details"]["db"]["type"], "database");
    }
}
