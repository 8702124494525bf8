//! The shelf: one state manager and one API client, wired together.
//!
//! Each operation performs the remote call first and only then writes the
//! outcome into the state, so a failed call leaves the state as it was.
//! List and selection writes go through a single `set_state` each.

use crate::api::{ApiClient, ApiError};
use crate::core::models::{
    Conversation, ConversationUpdate, Folder, FolderUpdate, NewPrompt, Prompt, PromptUpdate,
    UserProfile,
};
use crate::core::state::{StateError, StateManager, SECTION_CONVERSATIONS, SECTION_UI};
use chrono::Utc;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ShelfError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("failed to encode state update: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug)]
pub struct Shelf {
    state: StateManager,
    api: ApiClient,
}

impl Shelf {
    pub fn new(state: StateManager, api: ApiClient) -> Self {
        Self { state, api }
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Fetches the signed-in user into `user`. A rejected session marks the
    /// user as signed out before the error is returned.
    pub async fn refresh_session(&self) -> Result<UserProfile, ShelfError> {
        match self.api.get_session().await {
            Ok(profile) => {
                self.state
                    .update_user(json!({
                        "id": profile.id,
                        "name": profile.name,
                        "email": profile.email,
                        "authenticated": true,
                    }))
                    .await?;
                Ok(profile)
            }
            Err(err) if err.is_authentication() => {
                self.state
                    .update_user(json!({"authenticated": false}))
                    .await?;
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Replaces the stored conversation list with the remote one.
    pub async fn sync_conversations(&self) -> Result<Vec<Conversation>, ShelfError> {
        let items = self.api.get_conversations().await?;
        self.write_synced("items", &items).await?;
        debug!(count = items.len(), "Synced conversations");
        Ok(items)
    }

    pub async fn sync_folders(&self) -> Result<Vec<Folder>, ShelfError> {
        let folders = self.api.get_folders().await?;
        self.write_synced("folders", &folders).await?;
        debug!(count = folders.len(), "Synced folders");
        Ok(folders)
    }

    pub async fn sync_prompts(&self) -> Result<Vec<Prompt>, ShelfError> {
        let prompts = self.api.get_prompts().await?;
        self.write_synced("prompts", &prompts).await?;
        debug!(count = prompts.len(), "Synced prompts");
        Ok(prompts)
    }

    /// Fetches one conversation with its messages, stores it and selects it.
    pub async fn open_conversation(&self, id: &str) -> Result<Conversation, ShelfError> {
        let conversation = self.api.get_conversation(id).await?;
        let items = self
            .state
            .get_state()
            .conversations
            .with_conversation(conversation.clone());
        self.state
            .update_conversations(json!({
                "items": serde_json::to_value(items)?,
                "selectedId": conversation.id,
            }))
            .await?;
        Ok(conversation)
    }

    pub async fn create_conversation(&self, title: &str) -> Result<Conversation, ShelfError> {
        let conversation = self.api.create_conversation(title).await?;
        self.store_conversation(&conversation).await?;
        Ok(conversation)
    }

    pub async fn rename_conversation(
        &self,
        id: &str,
        title: &str,
    ) -> Result<Conversation, ShelfError> {
        let update = ConversationUpdate {
            title: Some(title.to_string()),
            ..Default::default()
        };
        let conversation = self.api.update_conversation(id, &update).await?;
        self.store_conversation(&conversation).await?;
        Ok(conversation)
    }

    /// Moves a conversation into `folder_id`, or out of any folder with `None`.
    pub async fn move_conversation(
        &self,
        id: &str,
        folder_id: Option<&str>,
    ) -> Result<Conversation, ShelfError> {
        let update = ConversationUpdate {
            folder_id: Some(folder_id.map(str::to_string)),
            ..Default::default()
        };
        let conversation = self.api.update_conversation(id, &update).await?;
        self.store_conversation(&conversation).await?;
        Ok(conversation)
    }

    /// Deletes remotely, drops the local copy, and clears the selection if it
    /// pointed at this conversation.
    pub async fn delete_conversation(&self, id: &str) -> Result<(), ShelfError> {
        self.api.delete_conversation(id).await?;
        let current = self.state.get_state().conversations;
        let mut patch = json!({
            "items": serde_json::to_value(current.without_conversation(id))?,
        });
        if current.selected_id.as_deref() == Some(id) {
            patch["selectedId"] = Value::Null;
        }
        self.state.update_conversations(patch).await?;
        Ok(())
    }

    /// Creates a folder. Without an explicit color the configured default
    /// folder color is used, if any.
    pub async fn create_folder(
        &self,
        name: &str,
        color: Option<&str>,
    ) -> Result<Folder, ShelfError> {
        let default_color = self.state.get_state().settings.default_folder_color;
        let color = color.or((!default_color.is_empty()).then_some(default_color.as_str()));
        let folder = self.api.create_folder(name, color).await?;
        self.store_folder(&folder).await?;
        Ok(folder)
    }

    pub async fn rename_folder(&self, id: &str, name: &str) -> Result<Folder, ShelfError> {
        let update = FolderUpdate {
            name: Some(name.to_string()),
            ..Default::default()
        };
        let folder = self.api.update_folder(id, &update).await?;
        self.store_folder(&folder).await?;
        Ok(folder)
    }

    /// Deletes a folder. Conversations filed under it keep their `folder_id`;
    /// the UI stops showing it as the active folder.
    pub async fn delete_folder(&self, id: &str) -> Result<(), ShelfError> {
        self.api.delete_folder(id).await?;
        let current = self.state.get_state();
        let mut patch = json!({
            SECTION_CONVERSATIONS: {
                "folders": serde_json::to_value(current.conversations.without_folder(id))?,
            },
        });
        if current.ui.active_folder_id.as_deref() == Some(id) {
            patch[SECTION_UI] = json!({"activeFolderId": null});
        }
        if current.ui.expanded_folders.iter().any(|folder| folder == id) {
            let expanded: Vec<&String> = current
                .ui
                .expanded_folders
                .iter()
                .filter(|folder| *folder != id)
                .collect();
            patch[SECTION_UI]["expandedFolders"] = serde_json::to_value(expanded)?;
        }
        self.state.set_state(patch).await?;
        Ok(())
    }

    pub async fn create_prompt(&self, prompt: &NewPrompt) -> Result<Prompt, ShelfError> {
        let prompt = self.api.create_prompt(prompt).await?;
        self.store_prompt(&prompt).await?;
        Ok(prompt)
    }

    pub async fn update_prompt(
        &self,
        id: &str,
        update: &PromptUpdate,
    ) -> Result<Prompt, ShelfError> {
        let prompt = self.api.update_prompt(id, update).await?;
        self.store_prompt(&prompt).await?;
        Ok(prompt)
    }

    pub async fn delete_prompt(&self, id: &str) -> Result<(), ShelfError> {
        self.api.delete_prompt(id).await?;
        let prompts = self.state.get_state().conversations.without_prompt(id);
        self.state
            .update_conversations(json!({"prompts": serde_json::to_value(prompts)?}))
            .await?;
        Ok(())
    }

    async fn write_synced<T: serde::Serialize>(
        &self,
        field: &str,
        list: &[T],
    ) -> Result<(), ShelfError> {
        let mut patch = json!({"lastSyncedAt": serde_json::to_value(Utc::now())?});
        patch[field] = serde_json::to_value(list)?;
        self.state.update_conversations(patch).await?;
        Ok(())
    }

    async fn store_conversation(&self, conversation: &Conversation) -> Result<(), ShelfError> {
        let items = self
            .state
            .get_state()
            .conversations
            .with_conversation(conversation.clone());
        self.state
            .update_conversations(json!({"items": serde_json::to_value(items)?}))
            .await?;
        Ok(())
    }

    async fn store_folder(&self, folder: &Folder) -> Result<(), ShelfError> {
        let folders = self
            .state
            .get_state()
            .conversations
            .with_folder(folder.clone());
        self.state
            .update_conversations(json!({"folders": serde_json::to_value(folders)?}))
            .await?;
        Ok(())
    }

    async fn store_prompt(&self, prompt: &Prompt) -> Result<(), ShelfError> {
        let prompts = self
            .state
            .get_state()
            .conversations
            .with_prompt(prompt.clone());
        self.state
            .update_conversations(json!({"prompts": serde_json::to_value(prompts)?}))
            .await?;
        Ok(())
    }
}
