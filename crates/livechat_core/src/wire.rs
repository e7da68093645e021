//! Response shapes of the remote chat service.
//!
//! Only the fields the client consumes are modelled. The service is lenient
//! about `null` for lists and strings, so those fields default instead of
//! failing the whole response.

use serde::{Deserialize, Deserializer, Serialize};

use crate::message::ChatMessage;
use crate::session::{ChatMode, ChatOption, InputType, User};
use crate::widget::WidgetConfig;

/// Deserialize `null` (or a missing field, with `#[serde(default)]`) as `T::default()`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `GET /livechat/config`
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ConfigResponse {
    #[serde(default)]
    pub config: Option<WidgetConfig>,
}

/// `POST /livechat/init`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct InitResponse {
    pub user: User,
    #[serde(default)]
    pub external_user_id: Option<i64>,
}

impl InitResponse {
    /// Id to use for the follow-up history fetch.
    pub fn history_user_id(&self) -> i64 {
        self.external_user_id.unwrap_or(self.user.id)
    }
}

/// `GET /livechat/history/{external_user_id}`
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct HistoryResponse {
    /// `None` when the service sent no list at all, which is not the same as
    /// an empty conversation.
    #[serde(default)]
    pub messages: Option<Vec<ChatMessage>>,
    #[serde(default)]
    pub session_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_live_agent_mode: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_options: Vec<ChatOption>,
    #[serde(default)]
    pub current_input_type: Option<String>,
}

impl HistoryResponse {
    pub fn messages(&self) -> &[ChatMessage] {
        self.messages.as_deref().unwrap_or_default()
    }
}

/// `POST /livechat/message`, for both text and file sends.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SendResponse {
    #[serde(default)]
    pub session_id: Option<i64>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Vec<ChatOption>,
    #[serde(default)]
    pub input_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ended: bool,
}

impl SendResponse {
    pub fn mode(&self) -> Option<ChatMode> {
        ChatMode::from_wire(self.mode.as_deref())
    }

    pub fn input_type(&self) -> InputType {
        InputType::from_wire(self.input_type.as_deref())
    }

    /// Reply text, ignoring empty strings.
    pub fn reply_text(&self) -> Option<&str> {
        self.response.as_deref().filter(|text| !text.is_empty())
    }
}

/// Body of a JSON text send.
#[derive(Serialize, Debug, Clone)]
pub struct SendMessageRequest<'a> {
    pub external_user_id: i64,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<&'a serde_json::Value>,
}

/// Error body returned with non-success statuses.
#[derive(Deserialize, Debug, Default)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Sender;
    use serde_json::json;

    #[test]
    fn test_send_response_with_nulls() {
        let response: SendResponse = serde_json::from_value(json!({
            "session_id": 3,
            "mode": "live_agent",
            "response": "",
            "options": null,
            "input_type": null,
            "ended": null
        }))
        .unwrap();

        assert_eq!(response.mode(), Some(ChatMode::LiveAgent));
        assert_eq!(response.reply_text(), None);
        assert!(response.options.is_empty());
        assert_eq!(response.input_type(), InputType::Text);
        assert!(!response.ended);
    }

    #[test]
    fn test_history_with_unrecognized_sender_still_parses() {
        let response: HistoryResponse = serde_json::from_value(json!({
            "messages": [
                { "id": 1, "content": "hello", "sender": "user", "timestamp": "2024-05-01T10:00:00Z" },
                { "id": 2, "content": "Agent joined", "sender": "system", "timestamp": "2024-05-01T10:00:01Z" },
                { "id": 3, "content": "Hi", "sender": "agent", "timestamp": "2024-05-01T10:00:02Z" }
            ]
        }))
        .unwrap();

        let senders: Vec<Sender> = response.messages().iter().map(|m| m.sender).collect();
        assert_eq!(senders, vec![Sender::User, Sender::Unknown, Sender::Agent]);
    }

    #[test]
    fn test_init_response_history_id_falls_back_to_user() {
        let response: InitResponse = serde_json::from_value(json!({
            "user": { "id": 7, "name": "Ada", "phone": "5551234567" }
        }))
        .unwrap();
        assert_eq!(response.history_user_id(), 7);
    }

    #[test]
    fn test_send_request_omits_missing_object() {
        let body = serde_json::to_value(SendMessageRequest {
            external_user_id: 7,
            message: "hello",
            object: None,
        })
        .unwrap();
        assert_eq!(body, json!({ "external_user_id": 7, "message": "hello" }));
    }
}
