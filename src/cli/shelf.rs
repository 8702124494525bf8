use std::error::Error;

use super::{print_json, ConversationCommands, Context, FolderCommands, PromptCommands};
use crate::core::models::{Conversation, NewPrompt, PromptUpdate};
use crate::core::state::SortOrder;

pub async fn run_conversations(
    context: &Context,
    command: ConversationCommands,
) -> Result<(), Box<dyn Error>> {
    match command {
        ConversationCommands::List { sync: false } => {
            let state = context.open_state().await?.get_state();
            let mut items = state.conversations.items;
            sort_conversations(&mut items, state.ui.sort_order);
            print_json(&items)
        }
        ConversationCommands::List { sync: true } => {
            let shelf = context.open_shelf().await?;
            let mut items = shelf.sync_conversations().await?;
            sort_conversations(&mut items, shelf.state().get_state().ui.sort_order);
            print_json(&items)
        }
        ConversationCommands::Show { id } => {
            let shelf = context.open_shelf().await?;
            print_json(&shelf.open_conversation(&id).await?)
        }
        ConversationCommands::Create { title } => {
            let shelf = context.open_shelf().await?;
            print_json(&shelf.create_conversation(&title).await?)
        }
        ConversationCommands::Rename { id, title } => {
            let shelf = context.open_shelf().await?;
            print_json(&shelf.rename_conversation(&id, &title).await?)
        }
        ConversationCommands::Move { id, folder } => {
            let shelf = context.open_shelf().await?;
            print_json(&shelf.move_conversation(&id, folder.as_deref()).await?)
        }
        ConversationCommands::Delete { id } => {
            let shelf = context.open_shelf().await?;
            shelf.delete_conversation(&id).await?;
            println!("Deleted conversation {id}");
            Ok(())
        }
    }
}

pub async fn run_folders(context: &Context, command: FolderCommands) -> Result<(), Box<dyn Error>> {
    match command {
        FolderCommands::List { sync: false } => {
            let state = context.open_state().await?;
            print_json(&state.get_state().conversations.folders)
        }
        FolderCommands::List { sync: true } => {
            let shelf = context.open_shelf().await?;
            print_json(&shelf.sync_folders().await?)
        }
        FolderCommands::Create { name, color } => {
            let shelf = context.open_shelf().await?;
            print_json(&shelf.create_folder(&name, color.as_deref()).await?)
        }
        FolderCommands::Rename { id, name } => {
            let shelf = context.open_shelf().await?;
            print_json(&shelf.rename_folder(&id, &name).await?)
        }
        FolderCommands::Delete { id } => {
            let shelf = context.open_shelf().await?;
            shelf.delete_folder(&id).await?;
            println!("Deleted folder {id}");
            Ok(())
        }
    }
}

pub async fn run_prompts(context: &Context, command: PromptCommands) -> Result<(), Box<dyn Error>> {
    match command {
        PromptCommands::List { sync: false } => {
            let state = context.open_state().await?;
            print_json(&state.get_state().conversations.prompts)
        }
        PromptCommands::List { sync: true } => {
            let shelf = context.open_shelf().await?;
            print_json(&shelf.sync_prompts().await?)
        }
        PromptCommands::Create {
            title,
            content,
            tags,
        } => {
            let shelf = context.open_shelf().await?;
            let prompt = NewPrompt {
                title,
                content,
                tags,
            };
            print_json(&shelf.create_prompt(&prompt).await?)
        }
        PromptCommands::Update { id, title, content } => {
            let update = PromptUpdate {
                title,
                content,
                tags: None,
            };
            if update.is_empty() {
                return Err("nothing to update; pass --title and/or --content".into());
            }
            let shelf = context.open_shelf().await?;
            print_json(&shelf.update_prompt(&id, &update).await?)
        }
        PromptCommands::Delete { id } => {
            let shelf = context.open_shelf().await?;
            shelf.delete_prompt(&id).await?;
            println!("Deleted prompt {id}");
            Ok(())
        }
    }
}

/// Orders conversations the way the sidebar shows them.
pub fn sort_conversations(items: &mut [Conversation], order: SortOrder) {
    match order {
        SortOrder::UpdatedDesc => items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
        SortOrder::UpdatedAsc => items.sort_by(|a, b| a.updated_at.cmp(&b.updated_at)),
        SortOrder::TitleAsc => items.sort_by_cached_key(|item| item.title.to_lowercase()),
    }
}
