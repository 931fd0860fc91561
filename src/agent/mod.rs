mod assembler;
pub mod config;
mod events;
mod orchestrator;

pub use assembler::{AssembledResponse, ResponseAssembler};
pub use config::AgentConfig;
pub use events::ConversationEvent;
pub use orchestrator::{Orchestrator, Turn};
