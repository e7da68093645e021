//! In-memory conversation state and the snapshots published from it.

use livechat_core::wire::{HistoryResponse, SendResponse};
use livechat_core::{
    ChatMessage, ChatMode, ChatOption, InputType, MessageId, PersistedSession, Sender, User,
    WidgetConfig,
};
use livechat_state::{ChatEvent, ChatPhase, PhaseTransition, StateMachine};

use crate::error::LiveChatError;

/// Everything the core knows about the conversation. Lives behind the core's
/// lock; all mutation goes through the methods below.
#[derive(Debug, Default)]
pub(crate) struct ChatState {
    pub machine: StateMachine,
    pub messages: Vec<ChatMessage>,
    pub is_loading: bool,
    pub error: Option<LiveChatError>,
    pub user: Option<User>,
    pub session_id: Option<i64>,
    pub current_options: Vec<ChatOption>,
    pub current_input_type: InputType,
    pub widget_config: Option<WidgetConfig>,
}

/// A message appended before the service confirmed it.
///
/// It must be either confirmed with the service response or rolled back,
/// which removes exactly that message again.
#[must_use]
#[derive(Debug)]
pub(crate) struct Tentative {
    id: MessageId,
}

impl Tentative {
    pub fn id(&self) -> &MessageId {
        &self.id
    }

    /// Keep the message and apply the response that confirmed it.
    pub fn confirm(self, state: &mut ChatState, response: &SendResponse) {
        state.apply_send_response(response);
    }

    /// Remove the message. Returns `false` if it was already gone, e.g. after
    /// a reset or a poll replaced the list.
    pub fn rollback(self, state: &mut ChatState) -> bool {
        let before = state.messages.len();
        state.messages.retain(|message| message.id != self.id);
        state.messages.len() != before
    }
}

impl ChatState {
    pub fn phase(&self) -> ChatPhase {
        self.machine.phase()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|user| user.id)
    }

    /// Adopt a user (and optionally session) read from the local store.
    pub fn restore(&mut self, user: User, session: Option<PersistedSession>) {
        let session = session.unwrap_or_default();
        self.user = Some(user);
        self.session_id = session.session_id;
        self.current_options = session.current_options;
        self.current_input_type = session.current_input_type;
        self.machine.handle_event(ChatEvent::SessionRestored {
            mode: ChatMode::from_flag(session.is_live_agent_mode),
        });
    }

    pub fn append_tentative(&mut self, message: ChatMessage) -> Tentative {
        let id = message.id.clone();
        self.messages.push(message);
        Tentative { id }
    }

    /// Apply the result of a text or file send.
    pub fn apply_send_response(&mut self, response: &SendResponse) {
        if let Some(session_id) = response.session_id {
            self.session_id = Some(session_id);
        }

        let mode = response.mode();
        if let Some(mode) = mode {
            self.machine.handle_event(ChatEvent::ModeChanged { mode });
        }

        if let Some(text) = response.reply_text() {
            let sender = if mode == Some(ChatMode::LiveAgent) {
                Sender::Agent
            } else {
                Sender::Bot
            };
            self.messages.push(ChatMessage::reply(text, sender));
        }

        self.current_options = response.options.clone();
        self.current_input_type = response.input_type();

        if response.ended {
            self.machine.handle_event(ChatEvent::ChatEnded);
        }
    }

    /// Replace the conversation with a history response. Empty histories are
    /// ignored so a fresh session does not wipe what is on screen.
    pub fn apply_history(&mut self, history: &HistoryResponse) -> bool {
        if history.messages().is_empty() {
            return false;
        }

        self.messages = history.messages().to_vec();
        self.session_id = history.session_id;
        self.current_options = history.current_options.clone();
        self.current_input_type = InputType::from_wire(history.current_input_type.as_deref());
        self.machine.handle_event(ChatEvent::ModeChanged {
            mode: ChatMode::from_flag(history.is_live_agent_mode),
        });
        true
    }

    /// Replace only the message list with a polled history.
    pub fn apply_poll(&mut self, history: HistoryResponse) -> bool {
        match history.messages {
            Some(messages) => {
                self.messages = messages;
                true
            }
            None => false,
        }
    }

    pub fn session_record(&self) -> PersistedSession {
        PersistedSession {
            session_id: self.session_id,
            is_live_agent_mode: self.phase().is_live_agent(),
            current_options: self.current_options.clone(),
            current_input_type: self.current_input_type,
        }
    }

    /// Which user's history should be polled, if any.
    pub fn polling_key(&self) -> Option<i64> {
        if self.phase().is_live_agent() {
            self.user_id()
        } else {
            None
        }
    }

    /// Back to the pre-registration state. The widget configuration belongs
    /// to the deployment, not the conversation, and is kept.
    pub fn reset(&mut self) {
        let widget_config = self.widget_config.take();
        let mut machine = std::mem::take(&mut self.machine);
        machine.reset();

        *self = Self {
            machine,
            widget_config,
            ..Self::default()
        };
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        let phase = self.phase();
        ChatSnapshot {
            phase,
            messages: self.messages.clone(),
            is_loading: self.is_loading,
            error: self.error.clone(),
            is_initialized: phase.is_initialized(),
            user: self.user.clone(),
            session_id: self.session_id,
            is_live_agent_mode: phase.is_live_agent(),
            current_options: self.current_options.clone(),
            current_input_type: self.current_input_type,
            has_ended: phase.has_ended(),
            widget_config: self.widget_config.clone(),
        }
    }

    pub fn transitions(&self) -> Vec<PhaseTransition> {
        self.machine.history().to_vec()
    }
}

/// Read-only view of the conversation for a front-end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatSnapshot {
    pub phase: ChatPhase,
    pub messages: Vec<ChatMessage>,
    pub is_loading: bool,
    pub error: Option<LiveChatError>,
    pub is_initialized: bool,
    pub user: Option<User>,
    pub session_id: Option<i64>,
    pub is_live_agent_mode: bool,
    pub current_options: Vec<ChatOption>,
    pub current_input_type: InputType,
    pub has_ended: bool,
    pub widget_config: Option<WidgetConfig>,
}

impl ChatSnapshot {
    /// Text entry is available while chatting, not waiting on a reply, and
    /// the service is not asking for a file.
    pub fn text_input_enabled(&self) -> bool {
        self.is_initialized
            && !self.has_ended
            && !self.is_loading
            && self.current_input_type == InputType::Text
    }

    pub fn file_input_enabled(&self) -> bool {
        self.is_initialized && !self.has_ended && !self.is_loading
    }

    /// Quick replies are hidden once the chat ended.
    pub fn visible_options(&self) -> &[ChatOption] {
        if self.has_ended {
            &[]
        } else {
            &self.current_options
        }
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}
