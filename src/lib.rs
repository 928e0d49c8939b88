//! Real-time multi-agent deliberation engine: schedules LLM personas across
//! dependent debate rounds and streams their tagged output to a client.

pub mod agents;
pub mod client;
pub mod config;
pub mod debate;
pub mod error;
pub mod message;
pub mod session;

pub use client::wrapper::{ChatStreamClient, MessageChunk, MessageChunkStream, TokenUsage};
pub use config::Settings;
pub use debate::{run_debate, DebateControl, StartDebateParams};
pub use error::{EngineError, EngineResult};
pub use message::{InboundCommand, OutboundRecord};
pub use session::SessionHandler;
