//! chatshelf keeps a local, persisted copy of the conversations, folders and
//! prompts of a hosted chat application and syncs it with the remote API.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the canonical state tree, its persistence, the domain
//!   models, configuration, and the [`core::app::Shelf`] that ties state and
//!   remote calls together.
//! - [`api`] is the authenticated client for the remote REST API, including
//!   the wire shapes and their mapping onto domain models.
//! - [`utils`] holds URL handling and logging setup.
//!
//! The binary (`src/main.rs`) routes through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod utils;
