//! End-to-end exercise of the debate engine through its public API: a scripted
//! upstream client standing in for the real Cerebras endpoint, driven through
//! `run_debate` exactly as the session handler would drive it.

use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream as fstream;
use tokio::sync::mpsc;

use parley::client::wrapper::{ChatStreamClient, MessageChunk, MessageChunkStream, MessageStreamFuture};
use parley::message::OutboundRecord;
use parley::{run_debate, DebateControl, Settings, StartDebateParams};

struct ScriptedClient {
    reply: String,
}

#[async_trait]
impl ChatStreamClient for ScriptedClient {
    fn stream_chat<'a>(&'a self, _model: &'a str, _system: &'a str, _user: &'a str) -> MessageStreamFuture<'a> {
        let chunk = MessageChunk {
            content: self.reply.clone(),
            finish_reason: Some("stop".to_string()),
            usage: None,
            completion_time_secs: None,
        };
        let items: Vec<Result<MessageChunk, Box<dyn Error + Send + Sync>>> = vec![Ok(chunk)];
        Box::pin(async move { Ok(Box::pin(fstream::iter(items)) as MessageChunkStream) })
    }

    fn base_url(&self) -> &str {
        "http://test.invalid"
    }
}

fn test_settings() -> Arc<Settings> {
    Arc::new(Settings {
        cerebras_api_key: Some("csk-testtesttest".to_string()),
        cerebras_base_url: "http://test.invalid".to_string(),
        host: "0.0.0.0".to_string(),
        port: 8000,
        frontend_url: "http://localhost:5173".to_string(),
        debug: false,
        fast_model_id: "llama3.1-8b".to_string(),
        pro_model_id: "gpt-oss-120b".to_string(),
    })
}

#[tokio::test]
async fn full_roster_debate_runs_every_round_and_completes() {
    let client = Arc::new(ScriptedClient { reply: "a considered position.".to_string() });
    let control = Arc::new(DebateControl::new());
    let (out_tx, mut out_rx) = mpsc::channel(1024);

    let params = StartDebateParams {
        query: "Should we expand into the EU market?".to_string(),
        model_tier: None,
        previous_context: None,
        selected_agents: vec![],
        industry: None,
        api_key: "csk-testtesttest".to_string(),
    };

    run_debate(params, test_settings(), client, control, out_tx).await;

    let mut round_starts: Vec<String> = Vec::new();
    let mut agent_dones = 0usize;
    let mut saw_complete = false;

    while let Some(record) = out_rx.recv().await {
        match record {
            OutboundRecord::RoundStart { name, .. } => round_starts.push(name),
            OutboundRecord::AgentDone { .. } => agent_dones += 1,
            OutboundRecord::DebateComplete { total_tokens, benchmark, .. } => {
                saw_complete = true;
                assert!(total_tokens > 0);
                assert!(!benchmark.agents.is_empty());
                assert_eq!(benchmark.rounds.len(), 5);
            }
            OutboundRecord::AgentError { agent_id, error, .. } => {
                panic!("unexpected agent error for {}: {}", agent_id, error);
            }
            _ => {}
        }
    }

    assert_eq!(
        round_starts,
        vec!["Opening Arguments", "Challenge", "Defense & Rebuttal", "Expert Analysis", "Final Verdict"]
    );
    // 2 + 2 + 2 + 3 + 1 participants across the five rounds for the full 8-agent roster.
    assert_eq!(agent_dones, 10);
    assert!(saw_complete);
}

#[tokio::test]
async fn industry_overlay_swaps_expert_round_specialists() {
    let client = Arc::new(ScriptedClient { reply: "on brand for fintech.".to_string() });
    let control = Arc::new(DebateControl::new());
    let (out_tx, mut out_rx) = mpsc::channel(1024);

    let params = StartDebateParams {
        query: "Should we launch a BNPL product?".to_string(),
        model_tier: Some("fast".to_string()),
        previous_context: None,
        selected_agents: vec![],
        industry: Some("fintech".to_string()),
        api_key: "csk-testtesttest".to_string(),
    };

    run_debate(params, test_settings(), client, control, out_tx).await;

    let mut saw_fintech_agent_token = false;
    while let Some(record) = out_rx.recv().await {
        if let OutboundRecord::AgentToken { agent_id, .. } = record {
            if agent_id == "fintech_compliance" || agent_id == "fintech_risk" {
                saw_fintech_agent_token = true;
            }
        }
    }
    assert!(saw_fintech_agent_token, "expected the fintech specialist pair to have spoken");
}

#[tokio::test]
async fn synthesizer_only_selection_runs_a_single_round() {
    let client = Arc::new(ScriptedClient { reply: "final verdict.".to_string() });
    let control = Arc::new(DebateControl::new());
    let (out_tx, mut out_rx) = mpsc::channel(1024);

    let params = StartDebateParams {
        query: "Summarize the prior debate.".to_string(),
        model_tier: None,
        previous_context: Some("=== ROUND 1 ===\n[Analyst]:\nWe should expand.".to_string()),
        selected_agents: vec!["synthesizer".to_string()],
        industry: None,
        api_key: "csk-testtesttest".to_string(),
    };

    run_debate(params, test_settings(), client, control, out_tx).await;

    let mut round_starts = 0usize;
    while let Some(record) = out_rx.recv().await {
        if matches!(record, OutboundRecord::RoundStart { .. }) {
            round_starts += 1;
        }
    }
    assert_eq!(round_starts, 1);
}
