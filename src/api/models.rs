//! Remote wire shapes.
//!
//! The host application is not consistent about field names across its
//! endpoints, so the raw types accept the known aliases. Everything that is
//! not an id is optional here; [`super::mapping`] fills the gaps.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct RawConversation {
    #[serde(alias = "uuid", deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, alias = "name")]
    pub title: Option<String>,
    #[serde(default, alias = "chat_messages")]
    pub messages: Option<Vec<RawMessage>>,
    #[serde(default, alias = "folderId", alias = "project_uuid")]
    pub folder_id: Option<String>,
    #[serde(default, alias = "createdAt", deserialize_with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updatedAt", deserialize_with = "timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    #[serde(default, alias = "uuid", deserialize_with = "optional_id_string")]
    pub id: Option<String>,
    #[serde(default, alias = "sender", alias = "author")]
    pub role: Option<String>,
    #[serde(default, alias = "text")]
    pub content: Option<String>,
    #[serde(default, alias = "createdAt", deserialize_with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFolder {
    #[serde(alias = "uuid", deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, alias = "title")]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPrompt {
    #[serde(alias = "uuid", deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, alias = "name")]
    pub title: Option<String>,
    #[serde(default, alias = "text", alias = "prompt")]
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSession {
    #[serde(default)]
    pub user: Option<RawSessionUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSessionUser {
    #[serde(default, alias = "uuid", deserialize_with = "optional_id_string")]
    pub id: Option<String>,
    #[serde(default, alias = "full_name", alias = "display_name")]
    pub name: Option<String>,
    #[serde(default, alias = "email_address")]
    pub email: Option<String>,
}

/// List endpoints answer either with a bare array or with an envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListPayload<T> {
    Bare(Vec<T>),
    Envelope {
        #[serde(
            alias = "data",
            alias = "results",
            alias = "conversations",
            alias = "folders",
            alias = "prompts"
        )]
        items: Vec<T>,
    },
}

impl<T> ListPayload<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            ListPayload::Bare(items) | ListPayload::Envelope { items } => items,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateConversationRequest<'a> {
    pub title: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CreateFolderRequest<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'a str>,
}

fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or numeric id, got {other}"
        ))),
    }
}

fn optional_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(id) => Ok(Some(id)),
        Value::Number(id) => Ok(Some(id.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected string or numeric id, got {other}"
        ))),
    }
}

/// RFC 3339 strings, or Unix time in seconds (milliseconds above 1e12).
fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let parsed = match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(raw) => Some(
            DateTime::parse_from_rfc3339(&raw)
                .map(|at| at.with_timezone(&Utc))
                .map_err(serde::de::Error::custom)?,
        ),
        Value::Number(raw) => {
            let seconds = raw
                .as_f64()
                .ok_or_else(|| serde::de::Error::custom("timestamp out of range"))?;
            let millis = if seconds.abs() >= 1e12 {
                seconds as i64
            } else {
                (seconds * 1000.0) as i64
            };
            Some(
                Utc.timestamp_millis_opt(millis)
                    .single()
                    .ok_or_else(|| serde::de::Error::custom("timestamp out of range"))?,
            )
        }
        other => {
            return Err(serde::de::Error::custom(format!(
                "expected timestamp, got {other}"
            )))
        }
    };
    Ok(parsed)
}
