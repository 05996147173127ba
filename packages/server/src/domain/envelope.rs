//! Message envelope and its wire representation.
//!
//! Envelopes are serialized to JSON text before they enter any queue; the
//! serialized [`WireFrame`] is what the hub fans out and the pumps write.

use axum::extract::ws::Utf8Bytes;
use serde::{Deserialize, Serialize};

use crate::error::RelayError;

use super::ConnectionId;

/// Content of the notice announcing that a connection joined.
pub const JOIN_NOTICE: &str = "New User Joined";

/// Content of the notice announcing that a connection left.
pub const LEAVE_NOTICE: &str = "Socket has disconnected";

/// Serialized envelope as it travels through the outbound queues.
///
/// Cloning is cheap (reference counted), so one frame is shared by every
/// recipient of a fan-out.
pub type WireFrame = Utf8Bytes;

/// A message record. Every field is optional; absent or empty fields are
/// left out of the serialized form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "is_blank")]
    pub sender: Option<String>,
    /// Reserved for directed delivery; the broadcast path never sets it.
    #[serde(default, skip_serializing_if = "is_blank")]
    pub recipient: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub content: Option<String>,
}

fn is_blank(field: &Option<String>) -> bool {
    field.as_deref().is_none_or(str::is_empty)
}

impl Envelope {
    /// Message sent by a client connection.
    pub fn message(sender: ConnectionId, content: impl Into<String>) -> Self {
        Self {
            sender: Some(sender.to_string()),
            recipient: None,
            content: Some(content.into()),
        }
    }

    /// Hub-generated notice that a connection joined.
    pub fn joined() -> Self {
        Self::notice(JOIN_NOTICE)
    }

    /// Hub-generated notice that a connection left.
    pub fn left() -> Self {
        Self::notice(LEAVE_NOTICE)
    }

    fn notice(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
            ..Self::default()
        }
    }

    /// Whether the envelope was generated by the hub rather than a client.
    pub fn is_notice(&self) -> bool {
        is_blank(&self.sender)
    }

    pub fn to_frame(&self) -> Result<WireFrame, RelayError> {
        let json = serde_json::to_string(self)?;
        Ok(WireFrame::from(json))
    }

    pub fn from_frame(frame: &str) -> Result<Self, RelayError> {
        Ok(serde_json::from_str(frame)?)
    }
}
