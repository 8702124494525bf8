use std::error::Error;

use serde_json::Value;

use super::{print_json, Context, StateCommands};
use crate::core::state::{partial_from_path, StatePath};

pub async fn run(context: &Context, command: StateCommands) -> Result<(), Box<dyn Error>> {
    let state = context.open_state().await?;
    match command {
        StateCommands::Show => print_json(&state.get_state()),
        StateCommands::Get { path } => match state.select(path.as_str()) {
            Some(value) => print_json(&value),
            None => Err(format!("nothing stored at '{path}'").into()),
        },
        StateCommands::Set { path, value } => {
            let path = StatePath::parse(&path);
            if path.is_root() {
                return Err("a path is required, e.g. settings.theme".into());
            }
            if let Some(index) = array_index_position(&path) {
                let list = path.segments()[..index].join(".");
                return Err(format!(
                    "'{path}' addresses an array element; set '{list}' to the whole array instead"
                )
                .into());
            }
            state
                .set_state(partial_from_path(&path, parse_value(&value)))
                .await?;
            println!("Updated {path}");
            Ok(())
        }
        StateCommands::Reset => {
            state.reset_state().await?;
            println!("State reset to defaults");
            Ok(())
        }
        StateCommands::ClearStorage => {
            state.clear_storage().await?;
            println!("Cleared persisted state");
            Ok(())
        }
    }
}

/// Position of the first segment that would index into an array.
pub(crate) fn array_index_position(path: &StatePath) -> Option<usize> {
    path.segments()
        .iter()
        .position(|segment| segment.parse::<usize>().is_ok())
}

/// JSON if it parses, otherwise the raw text as a string.
pub(crate) fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
