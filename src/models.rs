use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AlertError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InternStatus {
    Active,
    Completed,
    Terminated,
}

impl InternStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InternStatus::Active => "active",
            InternStatus::Completed => "completed",
            InternStatus::Terminated => "terminated",
        }
    }
}

impl FromStr for InternStatus {
    type Err = AlertError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "active" => Ok(InternStatus::Active),
            "completed" => Ok(InternStatus::Completed),
            "terminated" => Ok(InternStatus::Terminated),
            other => Err(AlertError::UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for InternStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One intern as handed to the alert engine by the roster store.
///
/// `end_date` is the raw `YYYY-MM-DD` text; the engine validates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
    pub department_name: String,
    pub end_date: String,
    pub status: InternStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    EndingSoon,
    Overdue,
    /// Set by consumers once an alert is handled; never produced by the engine.
    Completed,
}

impl AlertKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertKind::EndingSoon => "ending_soon",
            AlertKind::Overdue => "overdue",
            AlertKind::Completed => "completed",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    High,
    Medium,
}

impl AlertPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertPriority::High => "high",
            AlertPriority::Medium => "medium",
        }
    }
}

impl fmt::Display for AlertPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub intern_id: String,
    pub intern_name: String,
    pub department_name: String,
    pub end_date: String,
    pub days_left: i64,
    pub status: AlertKind,
    pub priority: AlertPriority,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSummary {
    pub total: usize,
    pub ending_soon: usize,
    pub overdue: usize,
    pub high_priority: usize,
    pub unread: usize,
}
