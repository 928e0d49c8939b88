//! Upstream streaming adapter (C1): a uniform asynchronous token-stream capability
//! wrapped around an OpenAI-compatible chat-completions HTTP API.

pub mod common;
pub mod openai;
pub mod wrapper;

pub use wrapper::{ChatStreamClient, MessageChunk, MessageChunkStream, MessageStreamFuture, TokenUsage};
