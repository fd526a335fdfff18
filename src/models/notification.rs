//! UI notification payloads attached to action responses.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationSeverity {
    Success,
}

/// A message the front end shows after an action, optionally asking it to
/// refresh the affected record.
#[derive(Debug, Clone, Serialize)]
pub struct UiNotification {
    pub severity: NotificationSeverity,
    pub message: String,
    pub refresh: bool,
}

impl UiNotification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: NotificationSeverity::Success,
            message: message.into(),
            refresh: true,
        }
    }
}

/// A record returned together with the notification for the action that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct Notified<T: Serialize> {
    #[serde(flatten)]
    pub record: T,
    #[serde(rename = "@ui.message")]
    pub notification: UiNotification,
}

impl<T: Serialize> Notified<T> {
    pub fn success(record: T, message: impl Into<String>) -> Self {
        Self {
            record,
            notification: UiNotification::success(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn notified_flattens_record() {
        let notified = Notified::success(json!({ "id": "U1", "trusted": true }), "done");
        let value = serde_json::to_value(&notified).unwrap();
        assert_eq!(value["id"], "U1");
        assert_eq!(value["trusted"], true);
        assert_eq!(value["@ui.message"]["severity"], "success");
        assert_eq!(value["@ui.message"]["message"], "done");
        assert_eq!(value["@ui.message"]["refresh"], true);
    }
}
