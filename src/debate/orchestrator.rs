//! Debate orchestrator (C7): drives the round loop, builds per-round prompts, and
//! emits the round-boundary, metrics, and completion records that the session
//! handler forwards to the client.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use crate::agents::base::Agent;
use crate::agents::industry::industry_agents;
use crate::agents::resolve::{build_agents, resolve_agent_ids};
use crate::client::wrapper::ChatStreamClient;
use crate::config::Settings;
use crate::debate::blackboard::Blackboard;
use crate::debate::control::DebateControl;
use crate::debate::executor::{run_round, RoundOutcome};
use crate::debate::metrics::{DebateBenchmark, RoundBenchmark};
use crate::debate::rounds::{build_debate_rounds, industry_label, DebateRound};
use crate::message::{BenchmarkReport, OutboundRecord};

/// Parameters for a single `start_debate` request, already validated by the
/// session handler (non-empty query, well-formed API key).
pub struct StartDebateParams {
    pub query: String,
    pub model_tier: Option<String>,
    pub previous_context: Option<String>,
    pub selected_agents: Vec<String>,
    pub industry: Option<String>,
    pub api_key: String,
}

/// Run a whole debate to completion, streaming every record onto `out_tx`.
///
/// Returns when the debate finishes normally (after emitting `debate_complete`)
/// or when the task is cancelled by the caller (session disconnect / new debate
/// superseding this one): cancellation is cooperative and simply drops this
/// future, matching §5 "no further records are emitted, no `debate_complete`".
pub async fn run_debate(
    params: StartDebateParams,
    settings: Arc<Settings>,
    client: Arc<dyn ChatStreamClient>,
    control: Arc<DebateControl>,
    out_tx: mpsc::Sender<OutboundRecord>,
) {
    let industry_key: Option<String> = params.industry.as_deref().filter(|i| industry_agents(i).is_some()).map(String::from);

    let resolved_ids = resolve_agent_ids(industry_key.as_deref(), &params.selected_agents);
    let agents: Vec<Agent> = build_agents(&resolved_ids, industry_key.as_deref(), client);
    let rounds = build_debate_rounds(&resolved_ids, industry_key.as_deref());

    let mut agent_name: std::collections::HashMap<String, String> = std::collections::HashMap::new();
    for agent in &agents {
        agent_name.insert(agent.descriptor.id.clone(), agent.descriptor.name.clone());
    }

    let model_id = settings.model_for_tier(params.model_tier.as_deref()).to_string();
    let fallback_model_id = settings.fallback_model_id().to_string();

    let mut blackboard = Blackboard::new();
    let cumulative_tokens = AtomicU64::new(0);
    let mut benchmark = DebateBenchmark::new();
    let debate_started = Instant::now();

    for round in &rounds {
        let participants: Vec<&Agent> = agents.iter().filter(|a| round.agents.contains(&a.descriptor.id)).collect();

        loop {
            let constraints = control.constraints_snapshot();
            let prompt = build_round_prompt(&params, industry_key.as_deref(), &constraints, round, &blackboard, &agent_name);

            let _ = out_tx.send(OutboundRecord::round_start(round.round_num, round.name, round.agents.clone())).await;
            let _ = out_tx.send(OutboundRecord::phase_start(round.round_num, round.name)).await;

            let round_started = Instant::now();
            let (outcome, agent_benchmarks) = run_round(
                round,
                &participants,
                &prompt,
                &model_id,
                &fallback_model_id,
                &mut blackboard,
                &control,
                &cumulative_tokens,
                debate_started,
                &out_tx,
            )
            .await;

            match outcome {
                RoundOutcome::Restart => continue,
                RoundOutcome::Completed => {
                    if let Some(earliest) = agent_benchmarks.values().filter_map(|a| a.ttft_ms).min() {
                        benchmark.note_first_token_ms(earliest);
                    }
                    for (agent_id, entry) in agent_benchmarks {
                        benchmark.agents.insert(agent_id, entry);
                    }
                    benchmark.rounds.insert(
                        round.round_num,
                        RoundBenchmark {
                            round: round.round_num,
                            name: round.name,
                            agents: round.agents.clone(),
                            duration_ms: (round_started.elapsed().as_secs_f64() * 1000.0).round() as i64,
                        },
                    );
                    break;
                }
            }
        }
    }

    let total_tokens = cumulative_tokens.load(std::sync::atomic::Ordering::Relaxed) as i64;
    let total_time = debate_started.elapsed().as_secs_f64();
    let avg_tokens_per_second = if total_time > 0.0 { total_tokens as f64 / total_time } else { 0.0 };
    let report: BenchmarkReport = (&benchmark).into();

    let _ = out_tx.send(OutboundRecord::debate_complete(total_tokens, total_time, avg_tokens_per_second, report)).await;
}

/// Concatenate a round's prompt per §4.5, in order:
/// industry context, previous-session context, the question, live constraints,
/// the round's instruction, and the blackboard's prior-round history.
fn build_round_prompt(
    params: &StartDebateParams,
    industry_key: Option<&str>,
    constraints: &[String],
    round: &DebateRound,
    blackboard: &Blackboard,
    agent_name: &std::collections::HashMap<String, String>,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(industry) = industry_key {
        parts.push(format!("INDUSTRY CONTEXT: {}", industry_label(industry)));
    }

    if let Some(prev) = &params.previous_context {
        if !prev.trim().is_empty() {
            parts.push(format!("=== PREVIOUS CONSULTATION CONTEXT ===\n{}", prev));
        }
    }

    parts.push(format!("CURRENT QUESTION: {}", params.query));

    if !constraints.is_empty() {
        let mut block = String::from("CRITICAL USER CONSTRAINTS (FOLLOW EXACTLY):");
        for (i, constraint) in constraints.iter().enumerate() {
            block.push_str(&format!("\n{}. {}", i + 1, constraint));
        }
        parts.push(block);
    }

    parts.push(format!("CURRENT ROUND: {}\nYOUR TASK: {}", round.name, round.context_prompt));

    let history = blackboard.context_for(round.round_num, &[], |id| {
        agent_name.get(id).cloned().unwrap_or_else(|| id.to_string())
    });
    if !history.trim().is_empty() {
        parts.push(format!(
            "=== DEBATE SO FAR ===\n{}\n=== END OF PRIOR DEBATE ===\nReference other participants by name where their input shaped your response.",
            history
        ));
    }

    parts.join("\n\n")
}
