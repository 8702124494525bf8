//! Pure conversions from remote wire shapes to domain entities.
//!
//! Every function here is total: whatever optional fields the remote leaves
//! out are filled with fixed defaults, and no function looks at the clock.

use super::models::{RawConversation, RawFolder, RawMessage, RawPrompt, RawSession};
use crate::core::models::{Conversation, Folder, Message, Prompt, Role, UserProfile};
use chrono::{DateTime, Utc};

/// Timestamp used when the remote omits `created_at`.
pub const MISSING_TIMESTAMP: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

pub fn map_conversation_from_api(raw: RawConversation) -> Conversation {
    let created_at = raw.created_at.unwrap_or(MISSING_TIMESTAMP);
    let updated_at = raw.updated_at.unwrap_or(created_at);
    let messages = raw
        .messages
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(index, message)| map_message_from_api(message, &raw.id, index, created_at))
        .collect();

    Conversation {
        title: raw.title.unwrap_or_default(),
        messages,
        folder_id: raw.folder_id.filter(|folder| !folder.is_empty()),
        created_at,
        updated_at,
        id: raw.id,
    }
}

/// Maps one message of `conversation_id`. `index` is its position in the
/// conversation and stands in for a missing id; `fallback_time` stands in
/// for a missing timestamp.
pub fn map_message_from_api(
    raw: RawMessage,
    conversation_id: &str,
    index: usize,
    fallback_time: DateTime<Utc>,
) -> Message {
    Message {
        id: raw
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("{conversation_id}:{index}")),
        role: map_role(raw.role.as_deref()),
        content: raw.content.unwrap_or_default(),
        created_at: raw.created_at.unwrap_or(fallback_time),
    }
}

pub fn map_role(raw: Option<&str>) -> Role {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        Some("assistant" | "ai" | "bot" | "model") => Role::Assistant,
        Some("system") => Role::System,
        _ => Role::User,
    }
}

pub fn map_folder_from_api(raw: RawFolder) -> Folder {
    Folder {
        id: raw.id,
        name: raw.name.unwrap_or_default(),
        color: raw.color.unwrap_or_default(),
    }
}

pub fn map_prompt_from_api(raw: RawPrompt) -> Prompt {
    Prompt {
        id: raw.id,
        title: raw.title.unwrap_or_default(),
        content: raw.content.unwrap_or_default(),
        tags: raw.tags.unwrap_or_default(),
    }
}

pub fn map_session_from_api(raw: RawSession) -> UserProfile {
    raw.user
        .map(|user| UserProfile {
            id: user.id,
            name: user.name,
            email: user.email,
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn raw<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> T {
        serde_json::from_value(value).expect("fixture should deserialize")
    }

    #[test]
    fn minimal_conversation_is_fully_populated() {
        let conversation =
            map_conversation_from_api(raw(json!({"id": "1", "title": "Hi"})));

        assert_eq!(
            conversation,
            Conversation {
                id: "1".to_string(),
                title: "Hi".to_string(),
                messages: Vec::new(),
                folder_id: None,
                created_at: MISSING_TIMESTAMP,
                updated_at: MISSING_TIMESTAMP,
            }
        );
    }

    #[test]
    fn missing_title_defaults_to_empty() {
        let conversation = map_conversation_from_api(raw(json!({"id": "7"})));
        assert_eq!(conversation.title, "");
    }

    #[test]
    fn updated_at_falls_back_to_created_at() {
        let conversation = map_conversation_from_api(raw(json!({
            "id": "1",
            "created_at": "2024-01-02T03:04:05Z"
        })));
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(conversation.created_at, expected);
        assert_eq!(conversation.updated_at, expected);
    }

    #[test]
    fn messages_get_ids_roles_and_timestamps() {
        let conversation = map_conversation_from_api(raw(json!({
            "id": "c1",
            "title": "Chat",
            "created_at": "2024-01-01T00:00:00Z",
            "messages": [
                {"id": "m1", "role": "user", "content": "hello", "created_at": "2024-01-01T00:01:00Z"},
                {"sender": "Assistant", "text": "hi there"},
                {"role": "system"},
                {"role": "tool", "content": "?"}
            ]
        })));

        let messages = &conversation.messages;
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].id, "m1");
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].id, "c1:1");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "hi there");
        assert_eq!(messages[1].created_at, conversation.created_at);
        assert_eq!(messages[2].role, Role::System);
        assert_eq!(messages[2].content, "");
        assert_eq!(messages[3].role, Role::User);
    }

    #[test]
    fn empty_folder_reference_is_none() {
        let conversation =
            map_conversation_from_api(raw(json!({"id": "1", "folder_id": ""})));
        assert_eq!(conversation.folder_id, None);
    }

    #[test]
    fn folder_and_prompt_defaults() {
        let folder = map_folder_from_api(raw(json!({"id": "f1"})));
        assert_eq!(
            folder,
            Folder {
                id: "f1".to_string(),
                name: String::new(),
                color: String::new(),
            }
        );

        let prompt = map_prompt_from_api(raw(json!({"id": 3, "prompt": "Explain {{x}}"})));
        assert_eq!(prompt.id, "3");
        assert_eq!(prompt.title, "");
        assert_eq!(prompt.content, "Explain {{x}}");
        assert!(prompt.tags.is_empty());
    }

    #[test]
    fn session_without_user_maps_to_empty_profile() {
        assert_eq!(
            map_session_from_api(raw(json!({}))),
            UserProfile::default()
        );
        let profile = map_session_from_api(raw(json!({
            "user": {"id": "u1", "full_name": "Alice", "email": "alice@example.com"}
        })));
        assert_eq!(profile.name.as_deref(), Some("Alice"));
        assert_eq!(profile.email.as_deref(), Some("alice@example.com"));
    }
}
