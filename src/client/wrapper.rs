//! Shared primitives for the upstream chat-completion adapter (C1).
//!
//! The engine talks to exactly one kind of upstream capability — an OpenAI-compatible
//! chat-completions endpoint — through the [`ChatStreamClient`] trait. The trait is
//! deliberately narrow: callers only ever need a lazy stream of [`MessageChunk`]s for
//! a `(model, system_prompt, user_prompt)` triple.

use async_trait::async_trait;
use futures_util::stream::Stream;
use std::error::Error;
use std::pin::Pin;

/// How many tokens were spent on prompt vs. completion, as reported by the upstream API.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokenUsage {
    /// Number of prompt/input tokens billed by the provider.
    pub prompt_tokens: usize,
    /// Number of generated/output tokens billed by the provider.
    pub completion_tokens: usize,
    /// Convenience total equal to `prompt_tokens + completion_tokens`.
    pub total_tokens: usize,
}

/// One incremental piece of a streaming chat-completion response.
///
/// A chunk may carry a text delta, a terminal usage snapshot, a server-reported
/// completion time, or any combination — upstream providers attach usage and timing
/// to the final chunk of a stream rather than every chunk.
#[derive(Clone, Debug, Default)]
pub struct MessageChunk {
    /// The incremental content delta in this chunk. Empty for chunks that only carry
    /// usage/finish metadata.
    pub content: String,
    /// Finish reason mirroring the provider's completion status (e.g. `"stop"`).
    pub finish_reason: Option<String>,
    /// Usage snapshot, present only on the terminal chunk of a stream (when the
    /// upstream API reports it at all).
    pub usage: Option<TokenUsage>,
    /// Server-reported wall time (seconds) spent generating the completion, present
    /// only on the terminal chunk when the upstream API reports it.
    pub completion_time_secs: Option<f64>,
}

/// A stream of upstream chunks, boxed so [`ChatStreamClient`] implementations can hide
/// their concrete async machinery behind a uniform type.
pub type MessageChunkStream =
    Pin<Box<dyn Stream<Item = Result<MessageChunk, Box<dyn Error + Send + Sync>>> + Send>>;

/// Type alias for the future returned by [`ChatStreamClient::stream_chat`].
pub type MessageStreamFuture<'a> =
    Pin<Box<dyn std::future::Future<Output = Result<MessageChunkStream, Box<dyn Error + Send + Sync>>> + Send + 'a>>;

/// Trait-driven abstraction over an OpenAI-compatible chat-completions provider.
///
/// Implementations **must** be thread-safe (`Send + Sync`) so they can be shared between
/// the concurrent per-agent tasks the round executor spawns.
#[async_trait]
pub trait ChatStreamClient: Send + Sync {
    /// Begin a streaming chat completion for `(model, system_prompt, user_prompt)`.
    ///
    /// The returned stream must hand iteration off to a worker task so that awaiting
    /// the next chunk is a genuine cooperative suspension point rather than blocking
    /// the caller's executor thread on the underlying synchronous SDK iterator.
    fn stream_chat<'a>(&'a self, model: &'a str, system_prompt: &'a str, user_prompt: &'a str) -> MessageStreamFuture<'a>;

    /// Base URL this client is configured against, surfaced for logging/diagnostics.
    fn base_url(&self) -> &str;
}
