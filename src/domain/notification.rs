//! Notifications sent to employees

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted notification. The client never edits or deletes one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id")]
    pub id: String,
    pub employee_id: String,
    pub message: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `POST /notifications`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub employee_id: String,
    pub message: String,
}

impl NewNotification {
    pub fn new(employee_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            message: message.into(),
        }
    }
}
