//! Message formatting utilities for client display.

use chrono::{DateTime, TimeZone};
use relay_server::domain::Envelope;

/// Length of the sender prefix shown next to messages.
const SHORT_ID_LEN: usize = 8;

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a text frame received from the relay.
    ///
    /// Frames that are not envelopes are shown as they are.
    pub fn format_frame<Tz>(text: &str, received_at: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        match Envelope::from_frame(text) {
            Ok(envelope) => Self::format_envelope(&envelope, received_at),
            Err(_) => Self::format_raw_message(text),
        }
    }

    /// Format an envelope.
    ///
    /// Hub notices (no sender) are shown as `* <content>`, messages as
    /// `[HH:MM:SS] <sender prefix>: <content>`.
    pub fn format_envelope<Tz>(envelope: &Envelope, received_at: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let content = envelope.content.as_deref().unwrap_or_default();

        if envelope.is_notice() {
            return format!("\n* {}\n", content);
        }

        format!(
            "\n[{}] {}: {}\n",
            received_at.format("%H:%M:%S"),
            Self::short_id(envelope.sender.as_deref().unwrap_or_default()),
            content
        )
    }

    /// Format a text frame that is not an envelope
    pub fn format_raw_message(text: &str) -> String {
        format!("\n{}\n", text)
    }

    /// Format a binary frame
    pub fn format_binary_message(len: usize) -> String {
        format!("\n(binary message, {} bytes)\n", len)
    }

    fn short_id(sender: &str) -> &str {
        sender
            .char_indices()
            .nth(SHORT_ID_LEN)
            .map_or(sender, |(end, _)| &sender[..end])
    }
}
