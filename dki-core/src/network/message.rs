// SPDX-FileCopyrightText: 2026 Don't Kill It! Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Wire Messages
//!
//! JSON frames exchanged over the notification socket:
//!
//! - inbound `{"type":"notification","data":{...}}` and `{"type":"pong"}`
//! - outbound `{"type":"ping"}`

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::NetworkError;

/// Category of a notification (`type` on the wire).
///
/// Values the backend adds later are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationCategory {
    /// Watering reminder.
    Watering,
    /// Feeding/fertilizing reminder.
    Feeding,
    /// Disease diagnosis result.
    Diagnosis,
    /// Account or service message.
    System,
    /// Unrecognized category.
    Other(String),
}

impl NotificationCategory {
    /// Returns the wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            NotificationCategory::Watering => "WATERING",
            NotificationCategory::Feeding => "FEEDING",
            NotificationCategory::Diagnosis => "DIAGNOSIS",
            NotificationCategory::System => "SYSTEM",
            NotificationCategory::Other(s) => s,
        }
    }
}

impl From<String> for NotificationCategory {
    fn from(s: String) -> Self {
        match s.as_str() {
            "WATERING" => NotificationCategory::Watering,
            "FEEDING" => NotificationCategory::Feeding,
            "DIAGNOSIS" => NotificationCategory::Diagnosis,
            "SYSTEM" => NotificationCategory::System,
            _ => NotificationCategory::Other(s),
        }
    }
}

impl From<NotificationCategory> for String {
    fn from(c: NotificationCategory) -> Self {
        match c {
            NotificationCategory::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery priority assigned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationPriority {
    Low,
    Normal,
    High,
    Urgent,
}

/// Payload of a `notification` frame.
///
/// Holds the payload exactly as received, plus a typed view over the fields
/// the app understands. Only `id` and `title` are required. Serializing a
/// notification yields the received payload, field for field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Notification {
    id: i64,
    title: String,
    message: Option<String>,
    category: Option<NotificationCategory>,
    priority: Option<NotificationPriority>,
    read: bool,
    plant_id: Option<i64>,
    created_at: Option<String>,
    link: Option<String>,
    payload: Map<String, Value>,
}

/// Typed view parsed out of the payload. Nulls read as absent.
#[derive(Deserialize)]
struct NotificationFields {
    id: i64,
    title: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(rename = "type", default)]
    category: Option<NotificationCategory>,
    #[serde(default)]
    priority: Option<NotificationPriority>,
    #[serde(default)]
    read: Option<bool>,
    #[serde(default)]
    plant_id: Option<i64>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    action_url: Option<String>,
}

impl TryFrom<Map<String, Value>> for Notification {
    type Error = serde_json::Error;

    fn try_from(payload: Map<String, Value>) -> Result<Self, Self::Error> {
        let fields: NotificationFields = serde_json::from_value(Value::Object(payload.clone()))?;

        Ok(Notification {
            id: fields.id,
            title: fields.title,
            message: fields.message,
            category: fields.category,
            priority: fields.priority,
            read: fields.read.unwrap_or(false),
            plant_id: fields.plant_id,
            created_at: fields.created_at,
            link: fields.link.or(fields.action_url),
            payload,
        })
    }
}

impl From<Notification> for Map<String, Value> {
    fn from(notification: Notification) -> Self {
        notification.payload
    }
}

impl Notification {
    /// Creates a notification with only the required fields set.
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        let title = title.into();
        let mut payload = Map::new();
        payload.insert("id".into(), Value::from(id));
        payload.insert("title".into(), Value::from(title.clone()));

        Notification {
            id,
            title,
            message: None,
            category: None,
            priority: None,
            read: false,
            plant_id: None,
            created_at: None,
            link: None,
            payload,
        }
    }

    /// Server-side notification ID.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Short headline.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Body text.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Category, sent as `type`.
    pub fn category(&self) -> Option<&NotificationCategory> {
        self.category.as_ref()
    }

    pub fn priority(&self) -> Option<NotificationPriority> {
        self.priority
    }

    /// Whether the user has already read it. A missing or null flag reads
    /// as unread.
    pub fn is_read(&self) -> bool {
        self.read
    }

    /// Plant the notification refers to, if any.
    pub fn plant_id(&self) -> Option<i64> {
        self.plant_id
    }

    /// ISO-8601 creation timestamp as sent by the server.
    pub fn created_at(&self) -> Option<&str> {
        self.created_at.as_deref()
    }

    /// Deep link into the app, from `link` or else `action_url`.
    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    /// Free-form `data` attached by the backend, unless absent or null.
    pub fn data(&self) -> Option<&Value> {
        self.payload.get("data").filter(|value| !value.is_null())
    }

    /// Payload exactly as received.
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }
}

/// A parsed inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// A notification to hand to the registered handler.
    Notification(Notification),
    /// Heartbeat acknowledgment.
    Pong,
    /// Any other `type`; carries the type string.
    Other(String),
}

#[derive(Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Option<Value>,
}

impl InboundFrame {
    /// Parses one text frame.
    pub fn parse(raw: &str) -> Result<Self, NetworkError> {
        let frame: RawFrame = serde_json::from_str(raw)?;

        match frame.kind.as_str() {
            "notification" => {
                let data = frame.data.ok_or_else(|| {
                    NetworkError::InvalidMessage("notification frame without data".into())
                })?;
                Ok(InboundFrame::Notification(serde_json::from_value(data)?))
            }
            "pong" => Ok(InboundFrame::Pong),
            _ => Ok(InboundFrame::Other(frame.kind)),
        }
    }
}

/// Frames this client sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundFrame {
    /// Keep-alive.
    Ping,
}

impl OutboundFrame {
    /// Serializes the frame to its JSON text form.
    pub fn to_json(&self) -> Result<String, NetworkError> {
        Ok(serde_json::to_string(self)?)
    }
}
