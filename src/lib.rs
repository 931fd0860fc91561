pub mod core;
pub mod tools;

// Provider lifecycle and tool aggregation
pub mod mcp;

// Model backend
pub mod llm;

// Turn orchestration
pub mod agent;

// Application surface
pub mod cli;
pub mod config;
pub mod logging;
