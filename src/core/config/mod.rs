pub mod data;
pub mod defaults;
pub mod io;
pub mod printing;

pub use data::{path_display, AuthScheme, Config};
pub use defaults::{CONFIG_KEYS, DEFAULT_SESSION_COOKIE};
pub use io::ConfigError;

#[cfg(test)]
pub mod tests;
