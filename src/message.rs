//! Message schema (C8): the inbound commands a client may send and the tagged
//! outbound records the engine streams back, per §6 of the design.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::debate::metrics::{AgentBenchmark, DebateBenchmark, RoundBenchmark};

/// Inbound command variants a client may send as a single JSON text frame.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundCommand {
    StartDebate {
        query: String,
        model: Option<String>,
        #[serde(rename = "previousContext")]
        previous_context: Option<String>,
        #[serde(rename = "selectedAgents")]
        selected_agents: Option<Vec<String>>,
        industry: Option<String>,
        #[serde(rename = "apiKey")]
        api_key: Option<String>,
    },
    InjectConstraint {
        constraint: String,
    },
}

/// `^csk-[A-Za-z0-9]{10,}$`, checked by hand rather than pulling in a regex crate
/// for a single fixed-shape pattern.
pub fn is_valid_api_key(key: &str) -> bool {
    match key.strip_prefix("csk-") {
        Some(rest) => rest.len() >= 10 && rest.chars().all(|c| c.is_ascii_alphanumeric()),
        None => false,
    }
}

/// Outbound record variants emitted downstream to the client, in emission order.
/// Every variant carries a UTC `timestamp`; construct these via the associated
/// functions below rather than the struct literals directly so the timestamp is
/// never forgotten.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundRecord {
    RoundStart {
        round: u32,
        name: String,
        agents: Vec<String>,
        timestamp: DateTime<Utc>,
    },
    PhaseStart {
        phase: u32,
        name: String,
        timestamp: DateTime<Utc>,
    },
    AgentToken {
        #[serde(rename = "agentId")]
        agent_id: String,
        content: String,
        timestamp: DateTime<Utc>,
    },
    AgentMetrics {
        #[serde(rename = "agentId")]
        agent_id: String,
        #[serde(rename = "tokensPerSecond")]
        tokens_per_second: f64,
        #[serde(rename = "promptTokens")]
        prompt_tokens: usize,
        #[serde(rename = "completionTokens")]
        completion_tokens: usize,
        #[serde(rename = "totalTokens")]
        total_tokens: usize,
        #[serde(rename = "completionTime")]
        completion_time: Option<f64>,
        timestamp: DateTime<Utc>,
    },
    AgentDone {
        #[serde(rename = "agentId")]
        agent_id: String,
        timestamp: DateTime<Utc>,
    },
    AgentError {
        #[serde(rename = "agentId")]
        agent_id: String,
        error: String,
        timestamp: DateTime<Utc>,
    },
    Metrics {
        #[serde(rename = "tokensPerSecond")]
        tokens_per_second: i64,
        #[serde(rename = "totalTokens")]
        total_tokens: i64,
        timestamp: DateTime<Utc>,
    },
    ConstraintAcknowledged {
        constraint: String,
        timestamp: DateTime<Utc>,
    },
    DebateComplete {
        #[serde(rename = "totalTokens")]
        total_tokens: i64,
        #[serde(rename = "totalTime")]
        total_time: f64,
        #[serde(rename = "avgTokensPerSecond")]
        avg_tokens_per_second: f64,
        benchmark: BenchmarkReport,
        timestamp: DateTime<Utc>,
    },
    Error {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl OutboundRecord {
    pub fn round_start(round: u32, name: &str, agents: Vec<String>) -> Self {
        OutboundRecord::RoundStart { round, name: name.to_string(), agents, timestamp: Utc::now() }
    }

    pub fn phase_start(phase: u32, name: &str) -> Self {
        OutboundRecord::PhaseStart { phase, name: name.to_string(), timestamp: Utc::now() }
    }

    pub fn agent_token(agent_id: &str, content: &str) -> Self {
        OutboundRecord::AgentToken { agent_id: agent_id.to_string(), content: content.to_string(), timestamp: Utc::now() }
    }

    pub fn agent_metrics(
        agent_id: &str,
        tokens_per_second: f64,
        prompt_tokens: usize,
        completion_tokens: usize,
        total_tokens: usize,
        completion_time: Option<f64>,
    ) -> Self {
        OutboundRecord::AgentMetrics {
            agent_id: agent_id.to_string(),
            tokens_per_second,
            prompt_tokens,
            completion_tokens,
            total_tokens,
            completion_time,
            timestamp: Utc::now(),
        }
    }

    pub fn agent_done(agent_id: &str) -> Self {
        OutboundRecord::AgentDone { agent_id: agent_id.to_string(), timestamp: Utc::now() }
    }

    pub fn agent_error(agent_id: &str, error: &str) -> Self {
        OutboundRecord::AgentError { agent_id: agent_id.to_string(), error: error.to_string(), timestamp: Utc::now() }
    }

    pub fn metrics_snapshot(tokens_per_second: i64, total_tokens: i64) -> Self {
        OutboundRecord::Metrics { tokens_per_second, total_tokens, timestamp: Utc::now() }
    }

    pub fn constraint_acknowledged(constraint: &str) -> Self {
        OutboundRecord::ConstraintAcknowledged { constraint: constraint.to_string(), timestamp: Utc::now() }
    }

    pub fn debate_complete(total_tokens: i64, total_time: f64, avg_tokens_per_second: f64, benchmark: BenchmarkReport) -> Self {
        OutboundRecord::DebateComplete { total_tokens, total_time, avg_tokens_per_second, benchmark, timestamp: Utc::now() }
    }

    pub fn error(message: &str) -> Self {
        OutboundRecord::Error { message: message.to_string(), timestamp: Utc::now() }
    }
}

/// Serializable snapshot of the per-debate benchmark record (§3), embedded in the
/// `debate_complete` record.
#[derive(Debug, Clone, Serialize, Default)]
pub struct BenchmarkReport {
    #[serde(rename = "timeToFirstTokenMs")]
    pub time_to_first_token_ms: Option<i64>,
    pub rounds: Vec<RoundBenchmarkReport>,
    pub agents: Vec<AgentBenchmarkReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundBenchmarkReport {
    pub round: u32,
    pub name: String,
    pub agents: Vec<String>,
    #[serde(rename = "durationMs")]
    pub duration_ms: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentBenchmarkReport {
    #[serde(rename = "agentId")]
    pub agent_id: String,
    pub round: u32,
    pub model: String,
    #[serde(rename = "timeToFirstTokenMs")]
    pub ttft_ms: Option<i64>,
    #[serde(rename = "avgInterTokenLatencyMs")]
    pub avg_itl_ms: Option<i64>,
    #[serde(rename = "p50InterTokenLatencyMs")]
    pub p50_itl_ms: Option<i64>,
    #[serde(rename = "p95InterTokenLatencyMs")]
    pub p95_itl_ms: Option<i64>,
    pub chunks: usize,
    #[serde(rename = "promptTokens")]
    pub prompt_tokens: Option<usize>,
    #[serde(rename = "completionTokens")]
    pub completion_tokens: Option<usize>,
    #[serde(rename = "totalTokens")]
    pub total_tokens: Option<usize>,
    #[serde(rename = "completionTimeSecs")]
    pub completion_time_secs: Option<f64>,
    #[serde(rename = "tokensPerSecond")]
    pub tokens_per_second: Option<f64>,
}

impl From<&DebateBenchmark> for BenchmarkReport {
    fn from(bm: &DebateBenchmark) -> Self {
        BenchmarkReport {
            time_to_first_token_ms: bm.time_to_first_token_ms,
            rounds: bm
                .rounds
                .values()
                .map(|r: &RoundBenchmark| RoundBenchmarkReport {
                    round: r.round,
                    name: r.name.to_string(),
                    agents: r.agents.clone(),
                    duration_ms: r.duration_ms,
                })
                .collect(),
            agents: bm
                .agents
                .iter()
                .map(|(agent_id, a): (&String, &AgentBenchmark)| AgentBenchmarkReport {
                    agent_id: agent_id.clone(),
                    round: a.round,
                    model: a.model.clone(),
                    ttft_ms: a.ttft_ms,
                    avg_itl_ms: a.avg_itl_ms,
                    p50_itl_ms: a.p50_itl_ms,
                    p95_itl_ms: a.p95_itl_ms,
                    chunks: a.chunks,
                    prompt_tokens: a.api.prompt_tokens,
                    completion_tokens: a.api.completion_tokens,
                    total_tokens: a.api.total_tokens,
                    completion_time_secs: a.api.completion_time_secs,
                    tokens_per_second: a.api.tokens_per_second,
                })
                .collect(),
        }
    }
}
