//! Channel-manager connection state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OTA connections the backend knows how to sync
pub const KNOWN_CHANNELS: &[&str] = &["airbnb", "booking", "etstur"];

/// One OTA connection as reported by `GET /channels`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConnection {
    pub channel: String,
    pub active: bool,
    pub last_sync: Option<DateTime<Utc>>,
}

impl ChannelConnection {
    pub fn inactive(channel: &str) -> Self {
        Self {
            channel: channel.to_string(),
            active: false,
            last_sync: None,
        }
    }
}

/// Every known channel in fixed order, filled from `reported`, followed by
/// any extra channel the backend returned
pub fn connection_board(reported: Vec<ChannelConnection>) -> Vec<ChannelConnection> {
    let mut board: Vec<ChannelConnection> = KNOWN_CHANNELS
        .iter()
        .map(|name| {
            reported
                .iter()
                .find(|c| c.channel == *name)
                .cloned()
                .unwrap_or_else(|| ChannelConnection::inactive(name))
        })
        .collect();

    for conn in reported {
        if !board.iter().any(|c| c.channel == conn.channel) {
            board.push(conn);
        }
    }
    board
}

/// Channel names end up in a URL path segment
pub fn is_valid_channel_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
