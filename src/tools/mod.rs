//! Tool provider side of the relay
//!
//! This module provides:
//! - `Tool` trait - Interface for operations a provider exposes
//! - `ToolInvocationResult` - The result contract of every operation
//! - `ToolRegistry` - The fixed tool set of one provider
//! - `grocery` / `food` - Built-in providers served over stdio
//! - `OrderIdStrategy` - How the built-in providers number orders

pub mod args;
pub mod food;
pub mod grocery;
mod order_id;
mod registry;
mod tool;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

// Core exports
pub use order_id::{OrderIdGenerator, OrderIdStrategy};
pub use registry::ToolRegistry;
pub use tool::{Tool, ToolInvocationResult};

/// Providers that ship with the relay binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinProvider {
    Grocery,
    Food,
}

impl BuiltinProvider {
    /// Build the provider's tool set with its standard dataset
    pub fn registry(self, strategy: OrderIdStrategy) -> ToolRegistry {
        match self {
            BuiltinProvider::Grocery => {
                grocery::registry(Arc::new(grocery::Catalog::standard()), strategy)
            }
            BuiltinProvider::Food => food::registry(Arc::new(food::FoodDataset::standard()), strategy),
        }
    }
}

impl FromStr for BuiltinProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grocery" => Ok(Self::Grocery),
            "food" => Ok(Self::Food),
            other => Err(format!("unknown provider '{other}' (expected grocery|food)")),
        }
    }
}

impl fmt::Display for BuiltinProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grocery => f.write_str("grocery"),
            Self::Food => f.write_str("food"),
        }
    }
}
