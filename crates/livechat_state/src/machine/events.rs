//! Chat events - Defines events that trigger phase transitions

use livechat_core::ChatMode;
use serde::{Deserialize, Serialize};

/// Defines the events that can trigger transitions in the FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChatEvent {
    // ========== Registration ==========
    /// The user submitted the registration form.
    RegistrationSubmitted,

    /// The service accepted the registration.
    RegistrationConfirmed,

    /// The registration request failed.
    RegistrationFailed,

    /// A saved user was found in the local store.
    SessionRestored { mode: ChatMode },

    // ========== Service-driven ==========
    /// A response reported who is answering.
    ModeChanged { mode: ChatMode },

    /// A response flagged the conversation as finished.
    ChatEnded,

    // ========== User ==========
    /// The user cleared the chat.
    Reset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_value(ChatEvent::ModeChanged {
            mode: ChatMode::LiveAgent,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "event": "mode_changed", "mode": "live_agent" })
        );
        assert_eq!(
            serde_json::to_value(ChatEvent::Reset).unwrap(),
            serde_json::json!({ "event": "reset" })
        );
    }
}
