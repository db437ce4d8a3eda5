//! Configuration loading, secrets, and component bootstrap.

pub mod bootstrap;
pub mod config;
pub mod secret;

pub use config::Config;
pub use secret::Secret;
