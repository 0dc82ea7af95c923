// src/health/component.rs
use super::status::{status_label, Status};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// State the registry keeps about one registered check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(serialize_with = "serialize_status")]
    pub status: Option<Status>,
    #[serde(rename = "time")]
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl Component {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            status: None,
            last_checked_at: None,
        }
    }

    pub(crate) fn record(&mut self, status: Status) {
        self.status = Some(status);
        self.last_checked_at = Some(Utc::now());
    }

    pub fn status_label(&self) -> &'static str {
        status_label(self.status)
    }
}

fn serialize_status<S: Serializer>(status: &Option<Status>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(status_label(*status))
}
