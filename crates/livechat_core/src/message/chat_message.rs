//! ChatMessage - A single entry of the conversation
//!
//! Messages come from two places: the service (history responses carry
//! server-issued ids) and the client itself (optimistic user messages and
//! bot/agent replies carry locally generated ids).

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::wire::null_as_default;

const TEMPORARY_PREFIX: &str = "temp_";

/// Identifier of a message.
///
/// The service issues numeric ids; locally created messages use prefixed
/// string ids so they can never collide with a server id.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum MessageId {
    Numeric(i64),
    Text(String),
}

impl MessageId {
    /// Create a fresh id for an optimistically appended message.
    ///
    /// `kind` distinguishes text (`temp_`) from file (`temp_file_`) placeholders.
    pub fn temporary(kind: Option<&str>) -> Self {
        let id = match kind {
            Some(kind) => format!("{TEMPORARY_PREFIX}{kind}_{}", Uuid::new_v4().simple()),
            None => format!("{TEMPORARY_PREFIX}{}", Uuid::new_v4().simple()),
        };
        Self::Text(id)
    }

    /// Create an id for a reply appended locally from a send response.
    pub fn local(prefix: &str) -> Self {
        Self::Text(format!("{prefix}_{}", Uuid::new_v4().simple()))
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// Who wrote a message.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
    Agent,
    /// Any sender tag this client does not know, e.g. system notices.
    #[serde(other)]
    Unknown,
}

/// File attached to a message.
///
/// Optimistic messages only know the name; `id` and `path` are filled in by
/// the service once the upload is confirmed and history is re-fetched.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MessageFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl MessageFile {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            path: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub id: MessageId,

    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,

    pub sender: Sender,

    /// ISO-8601 timestamp as produced by whoever created the message.
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<MessageFile>,
}

impl ChatMessage {
    /// Placeholder for a text the user just sent.
    pub fn pending_text(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::temporary(None),
            content: content.into(),
            sender: Sender::User,
            timestamp: now(),
            file: None,
        }
    }

    /// Placeholder for a file the user just attached.
    pub fn pending_file(file_name: &str) -> Self {
        Self {
            id: MessageId::temporary(Some("file")),
            content: format!("[File: {file_name}]"),
            sender: Sender::User,
            timestamp: now(),
            file: Some(MessageFile::named(file_name)),
        }
    }

    /// Reply text from a send response, tagged by who produced it.
    pub fn reply(content: impl Into<String>, sender: Sender) -> Self {
        let prefix = match sender {
            Sender::Agent => "agent",
            _ => "bot",
        };
        Self {
            id: MessageId::local(prefix),
            content: content.into(),
            sender,
            timestamp: now(),
            file: None,
        }
    }

    pub fn is_from_user(&self) -> bool {
        self.sender == Sender::User
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}
