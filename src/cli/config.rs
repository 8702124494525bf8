use std::error::Error;

use super::{Context, ConfigCommands};
use crate::core::config::path_display;

pub fn run(context: &Context, command: ConfigCommands) -> Result<(), Box<dyn Error>> {
    match command {
        ConfigCommands::Show => {
            println!("Config file: {}", path_display(&context.config_path));
            context.effective_config().print_all();
            Ok(())
        }
        ConfigCommands::Set { key, value } => {
            let mut config = context.file_config.clone();
            config.set_value(&key, &value)?;
            config.save_to_path(&context.config_path)?;
            println!("Set {key}");
            Ok(())
        }
        ConfigCommands::Unset { key } => {
            let mut config = context.file_config.clone();
            config.unset_value(&key)?;
            config.save_to_path(&context.config_path)?;
            println!("Unset {key}");
            Ok(())
        }
    }
}
