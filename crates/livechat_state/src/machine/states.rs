//! Session phases - All lifecycle states of a chat session

use livechat_core::ChatMode;
use serde::{Deserialize, Serialize};

/// Lifecycle phase of a chat session.
///
/// The mode (bot or live agent) is part of the phase so that "live agent
/// while ended" stays representable: an ended chat still shows which side
/// closed it.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ChatPhase {
    /// No user is known. Registration is required before sending.
    #[default]
    Uninitialized,

    /// Registration has been submitted and is awaiting the service.
    Initializing,

    /// A user is known and messages can be sent.
    Active { mode: ChatMode },

    /// The service closed the conversation. History stays visible.
    Ended { mode: ChatMode },
}

impl ChatPhase {
    /// A user is known (restored or freshly registered).
    pub fn is_initialized(&self) -> bool {
        matches!(self, Self::Active { .. } | Self::Ended { .. })
    }

    pub fn has_ended(&self) -> bool {
        matches!(self, Self::Ended { .. })
    }

    /// Whether send operations are allowed.
    pub fn accepts_messages(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    /// Current mode; phases without a user report `Bot`.
    pub fn mode(&self) -> ChatMode {
        match self {
            Self::Active { mode } | Self::Ended { mode } => *mode,
            _ => ChatMode::Bot,
        }
    }

    pub fn is_live_agent(&self) -> bool {
        self.mode().is_live_agent()
    }

    /// Get a human-readable description of the current phase.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Uninitialized => "Waiting for registration",
            Self::Initializing => "Starting chat",
            Self::Active {
                mode: ChatMode::Bot,
            } => "Chatting with assistant",
            Self::Active {
                mode: ChatMode::LiveAgent,
            } => "Chatting with an agent",
            Self::Ended { .. } => "Chat ended",
        }
    }
}
