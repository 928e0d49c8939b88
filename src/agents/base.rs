//! Agent (C2): pairs a persona with the upstream adapter to produce a tagged record
//! stream plus terminal metrics/done records.

use std::error::Error;
use std::sync::Arc;
use std::time::Instant;

use futures_util::stream::{Stream, StreamExt};
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::client::wrapper::ChatStreamClient;

/// Bound on the per-agent record channel. One slot per token keeps backpressure tight
/// without stalling a fast model on a slightly slower consumer.
const AGENT_CHANNEL_CAPACITY: usize = 128;

/// Immutable persona bound to an upstream model (§3 "Agent descriptor").
#[derive(Clone, Debug)]
pub struct AgentDescriptor {
    /// Stable short identifier, unique within a debate's resolved agent set.
    pub id: String,
    /// Human-facing display name.
    pub name: String,
    /// Hex UI color, e.g. `"#4287f5"`.
    pub color: String,
    /// Ordered capability tags (free-form; carried through for UI display only).
    pub capability_tags: Vec<String>,
    /// Persona system prompt text.
    pub system_prompt: String,
}

impl AgentDescriptor {
    pub fn new(id: &str, name: &str, color: &str, capability_tags: &[&str], system_prompt: &str) -> Self {
        AgentDescriptor {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
            capability_tags: capability_tags.iter().map(|s| s.to_string()).collect(),
            system_prompt: system_prompt.to_string(),
        }
    }
}

/// A non-terminal partial-text record from one agent.
#[derive(Clone, Debug)]
pub struct TokenRecord {
    pub agent_id: String,
    pub text: String,
}

/// The terminal per-agent usage record (§4.2).
#[derive(Clone, Debug)]
pub struct MetricsRecord {
    pub agent_id: String,
    pub tokens_per_second: f64,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
    pub completion_time_secs: Option<f64>,
}

/// The terminal completion marker for one agent in one round.
#[derive(Clone, Debug)]
pub struct DoneRecord {
    pub agent_id: String,
}

/// One record produced by an agent's stream, in emission order.
#[derive(Clone, Debug)]
pub enum AgentRecord {
    Token(TokenRecord),
    Metrics(MetricsRecord),
    Done(DoneRecord),
}

/// Literal prefix marking a synthesized error token (load-bearing: §4.6 keys its
/// retry decision off this exact prefix).
pub const ERROR_PREFIX: &str = "[Error:";

pub type AgentRecordStream = Pin<Box<dyn Stream<Item = AgentRecord> + Send>>;

/// A persona bound to an upstream client, ready to stream a response to one prompt.
#[derive(Clone)]
pub struct Agent {
    pub descriptor: AgentDescriptor,
    client: Arc<dyn ChatStreamClient>,
}

impl Agent {
    pub fn new(descriptor: AgentDescriptor, client: Arc<dyn ChatStreamClient>) -> Self {
        Agent { descriptor, client }
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    /// Stream a response to `user_prompt` against `model`.
    ///
    /// Produces zero or more [`TokenRecord`]s, then exactly one [`MetricsRecord`],
    /// then exactly one [`DoneRecord`]. On upstream failure the first (and only)
    /// token carries the `[Error: ...]` prefix the round executor keys its
    /// retry-with-fallback decision off of.
    pub fn stream(&self, user_prompt: &str, model: &str) -> AgentRecordStream {
        let agent_id = self.descriptor.id.clone();
        let system_prompt = self.descriptor.system_prompt.clone();
        let user_prompt = user_prompt.to_string();
        let model = model.to_string();
        let client = self.client.clone();

        let (tx, rx) = mpsc::channel(AGENT_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            run_agent_stream(client, agent_id, system_prompt, user_prompt, model, tx).await;
        });
        Box::pin(ReceiverStream::new(rx))
    }
}

async fn run_agent_stream(
    client: Arc<dyn ChatStreamClient>,
    agent_id: String,
    system_prompt: String,
    user_prompt: String,
    model: String,
    tx: mpsc::Sender<AgentRecord>,
) {
    let started = Instant::now();
    let mut completion_text = String::new();
    let mut usage: Option<crate::client::wrapper::TokenUsage> = None;
    let mut completion_time_secs: Option<f64> = None;

    match client.stream_chat(&model, &system_prompt, &user_prompt).await {
        Ok(mut chunks) => {
            while let Some(item) = chunks.next().await {
                match item {
                    Ok(chunk) => {
                        if !chunk.content.is_empty() {
                            completion_text.push_str(&chunk.content);
                            let record = AgentRecord::Token(TokenRecord {
                                agent_id: agent_id.clone(),
                                text: chunk.content,
                            });
                            if tx.send(record).await.is_err() {
                                return;
                            }
                        }
                        if chunk.usage.is_some() {
                            usage = chunk.usage;
                        }
                        if chunk.completion_time_secs.is_some() {
                            completion_time_secs = chunk.completion_time_secs;
                        }
                    }
                    Err(e) => {
                        let _ = send_error_token(&tx, &agent_id, e.as_ref()).await;
                        break;
                    }
                }
            }
        }
        Err(e) => {
            let _ = send_error_token(&tx, &agent_id, e.as_ref()).await;
        }
    }

    let elapsed_secs = started.elapsed().as_secs_f64();
    let (prompt_tokens, completion_tokens, total_tokens) = match usage {
        Some(u) => (u.prompt_tokens, u.completion_tokens, u.total_tokens),
        None => estimate_token_counts(&system_prompt, &user_prompt, &completion_text),
    };
    let duration_secs = completion_time_secs.unwrap_or(elapsed_secs).max(0.001);
    let tokens_per_second = completion_tokens as f64 / duration_secs;

    let _ = tx
        .send(AgentRecord::Metrics(MetricsRecord {
            agent_id: agent_id.clone(),
            tokens_per_second,
            prompt_tokens,
            completion_tokens,
            total_tokens,
            completion_time_secs,
        }))
        .await;
    let _ = tx.send(AgentRecord::Done(DoneRecord { agent_id })).await;
}

async fn send_error_token(tx: &mpsc::Sender<AgentRecord>, agent_id: &str, err: &(dyn Error + Send + Sync)) -> bool {
    let text = format!("{} {}]", ERROR_PREFIX, err);
    tx.send(AgentRecord::Token(TokenRecord {
        agent_id: agent_id.to_string(),
        text,
    }))
    .await
    .is_ok()
}

/// Rough token-count estimate (whitespace-delimited words) used only when the
/// upstream API does not report usage on the stream. Real providers usually do;
/// this keeps the metrics record populated with a plausible number rather than
/// zero when they don't.
fn estimate_token_counts(system_prompt: &str, user_prompt: &str, completion: &str) -> (usize, usize, usize) {
    let prompt_tokens = system_prompt.split_whitespace().count() + user_prompt.split_whitespace().count();
    let completion_tokens = completion.split_whitespace().count();
    (prompt_tokens, completion_tokens, prompt_tokens + completion_tokens)
}
