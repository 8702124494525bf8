//! The typed state tree and its compiled-in defaults.
//!
//! Every section keeps keys it does not recognise in `extra`, so data written
//! by a newer or older schema survives a load/save cycle.

use crate::core::models::{Conversation, Folder, Identified, Prompt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const SECTION_USER: &str = "user";
pub const SECTION_CONVERSATIONS: &str = "conversations";
pub const SECTION_UI: &str = "ui";
pub const SECTION_SETTINGS: &str = "settings";

/// Top-level sections, in persistence order.
pub const SECTIONS: [&str; 4] = [
    SECTION_USER,
    SECTION_CONVERSATIONS,
    SECTION_UI,
    SECTION_SETTINGS,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExtensionState {
    pub user: UserState,
    pub conversations: ConversationsState,
    pub ui: UiState,
    pub settings: Settings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct UserState {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub authenticated: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ConversationsState {
    pub items: Vec<Conversation>,
    pub folders: Vec<Folder>,
    pub prompts: Vec<Prompt>,
    pub selected_id: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    UpdatedDesc,
    UpdatedAsc,
    TitleAsc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UiState {
    pub sidebar_open: bool,
    pub active_folder_id: Option<String>,
    pub search_query: String,
    pub expanded_folders: Vec<String>,
    pub sort_order: SortOrder,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            sidebar_open: true,
            active_folder_id: None,
            search_query: String::new(),
            expanded_folders: Vec::new(),
            sort_order: SortOrder::default(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub theme: Theme,
    pub auto_sync: bool,
    pub sync_interval_secs: u64,
    pub confirm_delete: bool,
    pub show_timestamps: bool,
    /// Color given to new folders; empty means none.
    pub default_folder_color: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            auto_sync: true,
            sync_interval_secs: 300,
            confirm_delete: true,
            show_timestamps: true,
            default_folder_color: String::new(),
            extra: Map::new(),
        }
    }
}

impl ExtensionState {
    /// The documented initial state.
    pub fn initial() -> Self {
        Self::default()
    }

    pub fn to_tree(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn from_tree(tree: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(tree)
    }
}

impl ConversationsState {
    pub fn find_conversation(&self, id: &str) -> Option<&Conversation> {
        self.items.iter().find(|conversation| conversation.id == id)
    }

    /// Conversation list with `conversation` inserted, or replacing the entry
    /// with the same id in place.
    pub fn with_conversation(&self, conversation: Conversation) -> Vec<Conversation> {
        upsert_by_id(&self.items, conversation)
    }

    pub fn without_conversation(&self, id: &str) -> Vec<Conversation> {
        remove_by_id(&self.items, id)
    }

    /// Conversations whose folder reference points at `folder_id`.
    pub fn conversations_in_folder(&self, folder_id: &str) -> Vec<&Conversation> {
        self.items
            .iter()
            .filter(|conversation| conversation.folder_id.as_deref() == Some(folder_id))
            .collect()
    }

    pub fn find_folder(&self, id: &str) -> Option<&Folder> {
        self.folders.iter().find(|folder| folder.id == id)
    }

    pub fn with_folder(&self, folder: Folder) -> Vec<Folder> {
        upsert_by_id(&self.folders, folder)
    }

    pub fn without_folder(&self, id: &str) -> Vec<Folder> {
        remove_by_id(&self.folders, id)
    }

    pub fn find_prompt(&self, id: &str) -> Option<&Prompt> {
        self.prompts.iter().find(|prompt| prompt.id == id)
    }

    pub fn with_prompt(&self, prompt: Prompt) -> Vec<Prompt> {
        upsert_by_id(&self.prompts, prompt)
    }

    pub fn without_prompt(&self, id: &str) -> Vec<Prompt> {
        remove_by_id(&self.prompts, id)
    }
}

fn upsert_by_id<T: Identified + Clone>(items: &[T], item: T) -> Vec<T> {
    let mut out = items.to_vec();
    match out.iter().position(|existing| existing.id() == item.id()) {
        Some(index) => out[index] = item,
        None => out.push(item),
    }
    out
}

fn remove_by_id<T: Identified + Clone>(items: &[T], id: &str) -> Vec<T> {
    items
        .iter()
        .filter(|item| item.id() != id)
        .cloned()
        .collect()
}
