// src/health/status.rs
use serde::{Serialize, Serializer};
use std::fmt;

/// Result of a single check, and the rolled-up result of a whole pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Status {
    #[default]
    Pass,
    Fail,
    Warning,
}

impl Status {
    /// Severity used for rollup: Fail > Warning > Pass.
    pub fn severity(self) -> u8 {
        match self {
            Status::Pass => 1,
            Status::Warning => 2,
            Status::Fail => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pass => "pass",
            Status::Fail => "fail",
            Status::Warning => "warn",
        }
    }

    /// Fold one more check result into a running overall status.
    ///
    /// Fail always wins, Warning wins unless the rollup already failed,
    /// Pass never changes anything.
    pub fn rollup(self, next: Status) -> Status {
        match next {
            Status::Fail => Status::Fail,
            Status::Warning if self != Status::Fail => Status::Warning,
            _ => self,
        }
    }

    pub fn is_pass(self) -> bool {
        self == Status::Pass
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Display string for an optional status; anything unset is "unknown".
pub fn status_label(status: Option<Status>) -> &'static str {
    status.map(Status::as_str).unwrap_or("unknown")
}
