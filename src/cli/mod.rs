//! Command-line interface parsing and handling
//!
//! The binary is a headless front-end over the library: it loads the
//! configuration, opens the persisted state, and runs one command against it.

pub mod config;
pub mod shelf;
pub mod state;


use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;

use crate::api::ApiClient;
use crate::core::app::Shelf;
use crate::core::config::Config;
use crate::core::state::StateManager;
use crate::core::store::FileStore;
use crate::utils::logging;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_SHA"),
    ", built ",
    env!("VERGEN_BUILD_DATE"),
    ")"
);

#[derive(Parser)]
#[command(name = "chatshelf")]
#[command(version, long_version = LONG_VERSION)]
#[command(about = "Organize conversations, folders and prompts of a hosted chat application")]
#[command(
    long_about = "chatshelf keeps a local, persisted copy of your conversations, folders and \
prompts, and syncs it with the chat application's API.\n\n\
Configuration:\n\
  Use 'chatshelf config set base_url <url>' and 'chatshelf config set session_token <token>'.\n\n\
Environment Variables (override the config file):\n\
  CHATSHELF_BASE_URL        API base URL\n\
  CHATSHELF_SESSION_TOKEN   Session token\n\
  RUST_LOG                  Log filter (e.g. chatshelf=debug)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path to the persisted state file
    #[arg(long, global = true, value_name = "PATH")]
    pub state: Option<PathBuf>,

    /// Log more (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect or edit the local state
    State {
        #[command(subcommand)]
        command: StateCommands,
    },
    /// Manage conversations
    Conversations {
        #[command(subcommand)]
        command: ConversationCommands,
    },
    /// Manage folders
    Folders {
        #[command(subcommand)]
        command: FolderCommands,
    },
    /// Manage prompts
    Prompts {
        #[command(subcommand)]
        command: PromptCommands,
    },
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum StateCommands {
    /// Print the whole state
    Show,
    /// Print the value at a dotted path (e.g. settings.theme)
    Get { path: String },
    /// Merge a JSON value in at a dotted path
    Set {
        path: String,
        /// JSON value; anything that is not valid JSON is stored as a string
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Restore the initial state
    Reset,
    /// Delete the persisted state without touching what is loaded
    ClearStorage,
}

#[derive(Subcommand)]
pub enum ConversationCommands {
    /// List stored conversations
    List {
        /// Fetch the list from the remote first
        #[arg(long)]
        sync: bool,
    },
    /// Fetch a conversation with its messages and select it
    Show { id: String },
    Create { title: String },
    Rename { id: String, title: String },
    /// Move into a folder, or out of any folder without --folder
    Move {
        id: String,
        #[arg(long, value_name = "FOLDER_ID")]
        folder: Option<String>,
    },
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum FolderCommands {
    List {
        #[arg(long)]
        sync: bool,
    },
    Create {
        name: String,
        #[arg(long)]
        color: Option<String>,
    },
    Rename { id: String, name: String },
    /// Delete a folder; its conversations are kept
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum PromptCommands {
    List {
        #[arg(long)]
        sync: bool,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    Show,
    Set { key: String, value: String },
    Unset { key: String },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    logging::init(args.verbose);
    run(args).await
}

pub async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let context = Context::from_args(&args)?;
    match args.command {
        Commands::State { command } => state::run(&context, command).await,
        Commands::Conversations { command } => shelf::run_conversations(&context, command).await,
        Commands::Folders { command } => shelf::run_folders(&context, command).await,
        Commands::Prompts { command } => shelf::run_prompts(&context, command).await,
        Commands::Config { command } => config::run(&context, command),
    }
}

/// Paths and configuration resolved from the global flags.
pub struct Context {
    pub config_path: PathBuf,
    /// Configuration as stored on disk, without environment overrides.
    pub file_config: Config,
    state_override: Option<PathBuf>,
}

impl Context {
    pub fn from_args(args: &Args) -> Result<Self, Box<dyn Error>> {
        let config_path = match &args.config {
            Some(path) => path.clone(),
            None => Config::get_config_path()?,
        };
        let file_config = Config::load_from_path(&config_path)?;
        Ok(Self {
            config_path,
            file_config,
            state_override: args.state.clone(),
        })
    }

    /// Configuration with `CHATSHELF_*` overrides applied.
    pub fn effective_config(&self) -> Config {
        self.file_config.clone().with_env_overrides()
    }

    pub fn state_path(&self) -> Result<PathBuf, Box<dyn Error>> {
        self.state_override
            .clone()
            .or_else(|| self.effective_config().state_file())
            .ok_or_else(|| "could not determine where to keep the state; pass --state".into())
    }

    pub async fn open_state(&self) -> Result<StateManager, Box<dyn Error>> {
        let path = self.state_path()?;
        debug!(path = %path.display(), "Opening state");
        Ok(StateManager::load(Arc::new(FileStore::new(path))).await)
    }

    pub async fn open_shelf(&self) -> Result<Shelf, Box<dyn Error>> {
        let api = ApiClient::new(self.effective_config().api_settings()?)?;
        Ok(Shelf::new(self.open_state().await?, api))
    }
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
