//! Core types shared by every component
//!
//! - `RegistryError` / `DispatchError` / `TurnError` / `ConfigError` - Error taxonomy

pub mod error;

pub use error::{ConfigError, DispatchError, RegistryError, TurnError, TurnResult};
