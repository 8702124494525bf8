pub mod app;
pub mod config;
pub mod models;
pub mod state;
pub mod store;
