//! Round executor (C6): fans participants out in parallel, multiplexes their
//! tagged token streams, tracks per-agent timing/usage, and handles both
//! retry-with-fallback and mid-round interrupt-and-restart.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use futures_util::stream::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::agents::base::{Agent, AgentRecord, ERROR_PREFIX};
use crate::debate::blackboard::Blackboard;
use crate::debate::control::DebateControl;
use crate::debate::metrics::{AgentApiMetrics, AgentBenchmark, AgentTiming};
use crate::debate::retry::is_retryable_error;
use crate::debate::rounds::DebateRound;
use crate::message::OutboundRecord;

/// How often the merge queue is polled for the next record, bounding how quickly
/// an interrupt or a silence-warning is noticed (§5 "short bounded wait ≤ 100 ms").
const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Metrics-snapshot cadence: every 5th poll tick, i.e. every 500 ms (§4.6 "≤ twice
/// per second").
const METRICS_SNAPSHOT_EVERY_N_TICKS: u32 = 5;
/// How long a round may go without dequeuing any record before the executor logs
/// a pending-participant status line (§4.6 "status logging").
const SILENCE_WARNING: Duration = Duration::from_secs(5);

/// Control-flow result of running one round, replacing the source's
/// exception-based restart with an explicit value (§9 design notes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Completed,
    Restart,
}

/// Internal per-record signal flowing from per-agent tasks into the round's merge
/// queue. Distinct from [`AgentRecord`] because the executor also needs to signal
/// a collapsed retry failure and a fallback-model switch, neither of which is part
/// of the Agent (C2) contract.
enum RoundSignal {
    Record(AgentRecord),
    FallbackUsed { agent_id: String },
    Failed { agent_id: String, error_text: String },
}

/// Run one round to completion (or to an interrupt-triggered restart).
///
/// `participants` must be the subset of `agents` named by `round.agents`, in any
/// order; `debate_started` anchors the metrics-snapshot throughput calculation.
#[allow(clippy::too_many_arguments)]
pub async fn run_round(
    round: &DebateRound,
    participants: &[&Agent],
    prompt: &str,
    model_id: &str,
    fallback_model_id: &str,
    blackboard: &mut Blackboard,
    control: &DebateControl,
    cumulative_tokens: &AtomicU64,
    debate_started: Instant,
    out_tx: &mpsc::Sender<OutboundRecord>,
) -> (RoundOutcome, BTreeMap<String, AgentBenchmark>) {
    let (tx, mut rx) = mpsc::channel::<RoundSignal>(256);

    let mut pending: HashSet<String> = participants.iter().map(|a| a.id().to_string()).collect();
    let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(participants.len());
    let mut started_at: HashMap<String, Instant> = HashMap::new();

    for agent in participants {
        let agent = (*agent).clone();
        let agent_id = agent.id().to_string();
        let prompt = prompt.to_string();
        let model = model_id.to_string();
        let fallback = fallback_model_id.to_string();
        let tx = tx.clone();
        started_at.insert(agent_id, Instant::now());
        handles.push(tokio::spawn(async move {
            run_agent_with_retry(agent, prompt, model, fallback, tx).await;
        }));
    }
    drop(tx);

    let mut buffers: HashMap<String, String> = HashMap::new();
    let mut timings: HashMap<String, AgentTiming> = HashMap::new();
    let mut api_metrics: HashMap<String, AgentApiMetrics> = HashMap::new();
    let mut model_used: HashMap<String, String> = HashMap::new();
    let mut benchmarks: BTreeMap<String, AgentBenchmark> = BTreeMap::new();

    let mut last_activity = Instant::now();
    let mut last_status_log = Instant::now();
    let mut ticks_since_metrics: u32 = 0;

    loop {
        if control.take_interrupt() {
            for handle in &handles {
                handle.abort();
            }
            while rx.try_recv().is_ok() {}
            blackboard.clear_round(round.round_num);
            for handle in handles {
                let _ = handle.await;
            }
            return (RoundOutcome::Restart, BTreeMap::new());
        }

        match tokio::time::timeout(POLL_INTERVAL, rx.recv()).await {
            Ok(Some(signal)) => {
                last_activity = Instant::now();
                match signal {
                    RoundSignal::FallbackUsed { agent_id } => {
                        model_used.insert(agent_id, fallback_model_id.to_string());
                    }
                    RoundSignal::Failed { agent_id, error_text } => {
                        let _ = out_tx.send(OutboundRecord::agent_error(&agent_id, &error_text)).await;
                        let _ = out_tx.send(OutboundRecord::agent_done(&agent_id)).await;
                        pending.remove(&agent_id);
                    }
                    RoundSignal::Record(AgentRecord::Token(token)) => {
                        let now = Instant::now();
                        let timing = timings.entry(token.agent_id.clone()).or_insert_with(|| {
                            let mut t = AgentTiming::default();
                            if let Some(started) = started_at.get(&token.agent_id) {
                                t.mark_started(*started);
                            }
                            t
                        });
                        timing.mark_token(now);
                        buffers.entry(token.agent_id.clone()).or_default().push_str(&token.text);
                        // Live per-chunk counter (one per non-error token, mirroring the
                        // original's `self.token_count += 1` in its generic token branch) so
                        // the periodic metrics snapshot below actually moves during a round
                        // instead of sitting flat until an agent's terminal Metrics record.
                        cumulative_tokens.fetch_add(1, Ordering::Relaxed);
                        let _ = out_tx.send(OutboundRecord::agent_token(&token.agent_id, &token.text)).await;
                    }
                    RoundSignal::Record(AgentRecord::Metrics(metrics)) => {
                        api_metrics.insert(
                            metrics.agent_id.clone(),
                            AgentApiMetrics {
                                prompt_tokens: Some(metrics.prompt_tokens),
                                completion_tokens: Some(metrics.completion_tokens),
                                total_tokens: Some(metrics.total_tokens),
                                completion_time_secs: metrics.completion_time_secs,
                                tokens_per_second: Some(metrics.tokens_per_second),
                            },
                        );
                        let _ = out_tx
                            .send(OutboundRecord::agent_metrics(
                                &metrics.agent_id,
                                metrics.tokens_per_second,
                                metrics.prompt_tokens,
                                metrics.completion_tokens,
                                metrics.total_tokens,
                                metrics.completion_time_secs,
                            ))
                            .await;
                    }
                    RoundSignal::Record(AgentRecord::Done(done)) => {
                        let text = buffers.remove(&done.agent_id).unwrap_or_default();
                        blackboard.put_final(round.round_num, &done.agent_id, &text);

                        let timing = timings.remove(&done.agent_id).unwrap_or_default();
                        let api = api_metrics.remove(&done.agent_id).unwrap_or_default();
                        benchmarks.insert(
                            done.agent_id.clone(),
                            AgentBenchmark {
                                round: round.round_num,
                                model: model_used.get(&done.agent_id).cloned().unwrap_or_else(|| model_id.to_string()),
                                ttft_ms: timing.ttft_ms(),
                                avg_itl_ms: timing.avg_itl_ms(),
                                p50_itl_ms: timing.p50_itl_ms(),
                                p95_itl_ms: timing.p95_itl_ms(),
                                chunks: timing.chunks(),
                                api,
                            },
                        );
                        let _ = out_tx.send(OutboundRecord::agent_done(&done.agent_id)).await;
                        pending.remove(&done.agent_id);
                    }
                }
                if pending.is_empty() {
                    break;
                }
            }
            Ok(None) => break,
            Err(_elapsed) => {
                ticks_since_metrics += 1;
                if ticks_since_metrics >= METRICS_SNAPSHOT_EVERY_N_TICKS {
                    ticks_since_metrics = 0;
                    let total = cumulative_tokens.load(Ordering::Relaxed) as i64;
                    let elapsed = debate_started.elapsed().as_secs_f64().max(0.001);
                    let rate = (total as f64 / elapsed).round() as i64;
                    let _ = out_tx.send(OutboundRecord::metrics_snapshot(rate, total)).await;
                }
                if last_activity.elapsed() > SILENCE_WARNING && last_status_log.elapsed() > SILENCE_WARNING {
                    last_status_log = Instant::now();
                    let waiting: Vec<String> = pending
                        .iter()
                        .map(|id| {
                            let age = started_at.get(id).map(|s| s.elapsed().as_secs_f64()).unwrap_or(0.0);
                            format!("{} ({:.1}s)", id, age)
                        })
                        .collect();
                    log::warn!("round {} '{}' still waiting on: {}", round.round_num, round.name, waiting.join(", "));
                }
            }
        }
    }

    for handle in handles {
        let _ = handle.await;
    }

    (RoundOutcome::Completed, benchmarks)
}

/// Drive one agent for a round, applying retry-with-fallback on a retryable
/// first-token error (§4.6), and forward the outcome onto the round's merge queue.
async fn run_agent_with_retry(agent: Agent, prompt: String, model: String, fallback_model: String, tx: mpsc::Sender<RoundSignal>) {
    let agent_id = agent.id().to_string();
    let (first, mut stream) = lead_record(&agent, &prompt, &model).await;
    let Some(first_record) = first else { return };

    let error_text = match &first_record {
        AgentRecord::Token(t) if t.text.starts_with(ERROR_PREFIX) => Some(t.text.clone()),
        _ => None,
    };

    let Some(error_text) = error_text else {
        let _ = tx.send(RoundSignal::Record(first_record)).await;
        relay_rest(&mut stream, &tx).await;
        return;
    };

    if is_retryable_error(&error_text) && fallback_model != model {
        drain(&mut stream).await;
        let (retry_first, mut retry_stream) = lead_record(&agent, &prompt, &fallback_model).await;
        if let Some(retry_first) = retry_first {
            let retry_error_text = match &retry_first {
                AgentRecord::Token(t) if t.text.starts_with(ERROR_PREFIX) => Some(t.text.clone()),
                _ => None,
            };
            match retry_error_text {
                None => {
                    let _ = tx.send(RoundSignal::FallbackUsed { agent_id: agent_id.clone() }).await;
                    let _ = tx.send(RoundSignal::Record(retry_first)).await;
                    relay_rest(&mut retry_stream, &tx).await;
                }
                Some(final_error) => {
                    drain(&mut retry_stream).await;
                    let _ = tx.send(RoundSignal::Failed { agent_id, error_text: final_error }).await;
                }
            }
        }
        return;
    }

    drain(&mut stream).await;
    let _ = tx.send(RoundSignal::Failed { agent_id, error_text }).await;
}

async fn lead_record(agent: &Agent, prompt: &str, model: &str) -> (Option<AgentRecord>, crate::agents::base::AgentRecordStream) {
    let mut stream = agent.stream(prompt, model);
    let first = stream.next().await;
    (first, stream)
}

async fn relay_rest(stream: &mut crate::agents::base::AgentRecordStream, tx: &mpsc::Sender<RoundSignal>) {
    while let Some(record) = stream.next().await {
        if tx.send(RoundSignal::Record(record)).await.is_err() {
            return;
        }
    }
}

async fn drain(stream: &mut crate::agents::base::AgentRecordStream) {
    while stream.next().await.is_some() {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::base::AgentDescriptor;
    use crate::client::wrapper::{ChatStreamClient, MessageChunk, MessageChunkStream, MessageStreamFuture};
    use crate::debate::rounds::DebateRound;
    use async_trait::async_trait;
    use futures_util::stream as fstream;
    use std::error::Error;
    use std::sync::Arc;

    struct ScriptedClient {
        by_model: HashMap<String, Vec<Result<MessageChunk, String>>>,
    }

    #[async_trait]
    impl ChatStreamClient for ScriptedClient {
        fn stream_chat<'a>(&'a self, model: &'a str, _system: &'a str, _user: &'a str) -> MessageStreamFuture<'a> {
            let items: Vec<Result<MessageChunk, Box<dyn Error + Send + Sync>>> = self
                .by_model
                .get(model)
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .map(|r| r.map_err(|e| Box::new(crate::client::common::StreamError(e)) as Box<dyn Error + Send + Sync>))
                .collect();
            Box::pin(async move { Ok(Box::pin(fstream::iter(items)) as MessageChunkStream) })
        }

        fn base_url(&self) -> &str {
            "http://test.invalid"
        }
    }

    fn chunk(text: &str) -> Result<MessageChunk, String> {
        Ok(MessageChunk { content: text.to_string(), finish_reason: None, usage: None, completion_time_secs: None })
    }

    fn test_round(agents: Vec<&str>) -> DebateRound {
        DebateRound {
            round_num: 1,
            name: "Opening Arguments",
            agents: agents.into_iter().map(String::from).collect(),
            context_prompt: "open".to_string(),
        }
    }

    #[tokio::test]
    async fn happy_round_populates_blackboard_and_benchmarks() {
        let mut by_model = HashMap::new();
        by_model.insert("pro-model".to_string(), vec![chunk("Hello"), chunk(" world")]);
        let client = Arc::new(ScriptedClient { by_model });
        let descriptor = AgentDescriptor::new("analyst", "Analyst", "#000", &[], "You are an analyst.");
        let agent = Agent::new(descriptor, client);
        let agents = vec![agent];
        let participants: Vec<&Agent> = agents.iter().collect();

        let round = test_round(vec!["analyst"]);
        let mut blackboard = Blackboard::new();
        let control = DebateControl::new();
        let cumulative = AtomicU64::new(0);
        let (out_tx, mut out_rx) = mpsc::channel(64);

        let (outcome, benchmarks) = run_round(
            &round,
            &participants,
            "prompt",
            "pro-model",
            "fast-model",
            &mut blackboard,
            &control,
            &cumulative,
            Instant::now(),
            &out_tx,
        )
        .await;
        drop(out_tx);

        assert_eq!(outcome, RoundOutcome::Completed);
        assert!(benchmarks.contains_key("analyst"));

        let mut saw_done = false;
        while let Some(record) = out_rx.recv().await {
            if matches!(record, OutboundRecord::AgentDone { .. }) {
                saw_done = true;
            }
        }
        assert!(saw_done);

        let ctx = blackboard.context_for(2, &[], |id| id.to_string());
        assert!(ctx.contains("Hello world"));
    }

    #[tokio::test]
    async fn retryable_error_falls_back_once_then_succeeds() {
        let mut by_model = HashMap::new();
        by_model.insert("pro-model".to_string(), vec![Err("rate limit exceeded".to_string())]);
        by_model.insert("fast-model".to_string(), vec![chunk("recovered")]);
        let client = Arc::new(ScriptedClient { by_model });
        let descriptor = AgentDescriptor::new("critic", "Critic", "#000", &[], "You are a critic.");
        let agent = Agent::new(descriptor, client);
        let agents = vec![agent];
        let participants: Vec<&Agent> = agents.iter().collect();

        let round = test_round(vec!["critic"]);
        let mut blackboard = Blackboard::new();
        let control = DebateControl::new();
        let cumulative = AtomicU64::new(0);
        let (out_tx, mut out_rx) = mpsc::channel(64);

        let (outcome, _benchmarks) = run_round(
            &round,
            &participants,
            "prompt",
            "pro-model",
            "fast-model",
            &mut blackboard,
            &control,
            &cumulative,
            Instant::now(),
            &out_tx,
        )
        .await;
        drop(out_tx);
        assert_eq!(outcome, RoundOutcome::Completed);

        let mut saw_error_token = false;
        let mut saw_recovered_token = false;
        let mut saw_agent_error = false;
        while let Some(record) = out_rx.recv().await {
            match record {
                OutboundRecord::AgentToken { content, .. } => {
                    if content.starts_with(ERROR_PREFIX) {
                        saw_error_token = true;
                    }
                    if content == "recovered" {
                        saw_recovered_token = true;
                    }
                }
                OutboundRecord::AgentError { .. } => saw_agent_error = true,
                _ => {}
            }
        }
        assert!(!saw_error_token, "error-prefixed text must never reach the client");
        assert!(saw_recovered_token);
        assert!(!saw_agent_error);
    }

    #[tokio::test]
    async fn non_retryable_error_collapses_to_agent_error_with_no_fallback_attempt() {
        let mut by_model = HashMap::new();
        by_model.insert("pro-model".to_string(), vec![Err("invalid API key".to_string())]);
        let client = Arc::new(ScriptedClient { by_model });
        let descriptor = AgentDescriptor::new("critic", "Critic", "#000", &[], "You are a critic.");
        let agent = Agent::new(descriptor, client);
        let agents = vec![agent];
        let participants: Vec<&Agent> = agents.iter().collect();

        let round = test_round(vec!["critic"]);
        let mut blackboard = Blackboard::new();
        let control = DebateControl::new();
        let cumulative = AtomicU64::new(0);
        let (out_tx, mut out_rx) = mpsc::channel(64);

        let (outcome, _benchmarks) = run_round(
            &round,
            &participants,
            "prompt",
            "pro-model",
            "fast-model",
            &mut blackboard,
            &control,
            &cumulative,
            Instant::now(),
            &out_tx,
        )
        .await;
        drop(out_tx);
        assert_eq!(outcome, RoundOutcome::Completed);

        let mut saw_agent_error = false;
        let mut saw_agent_done = false;
        while let Some(record) = out_rx.recv().await {
            match record {
                OutboundRecord::AgentError { agent_id, .. } => {
                    assert_eq!(agent_id, "critic");
                    saw_agent_error = true;
                }
                OutboundRecord::AgentDone { .. } => saw_agent_done = true,
                OutboundRecord::AgentToken { .. } => panic!("no token should be emitted for a non-retryable failure"),
                _ => {}
            }
        }
        assert!(saw_agent_error);
        assert!(saw_agent_done);
    }

    #[tokio::test]
    async fn interrupt_clears_round_and_returns_restart() {
        let mut by_model = HashMap::new();
        by_model.insert("pro-model".to_string(), vec![chunk("partial")]);
        let client = Arc::new(ScriptedClient { by_model });
        let descriptor = AgentDescriptor::new("analyst", "Analyst", "#000", &[], "You are an analyst.");
        let agent = Agent::new(descriptor, client);
        let agents = vec![agent];
        let participants: Vec<&Agent> = agents.iter().collect();

        let round = test_round(vec!["analyst"]);
        let mut blackboard = Blackboard::new();
        blackboard.put_final(1, "analyst", "stale text from before restart");
        let control = DebateControl::new();
        control.inject_constraint("budget under $50k".to_string());
        let cumulative = AtomicU64::new(0);
        let (out_tx, _out_rx) = mpsc::channel(64);

        let (outcome, benchmarks) = run_round(
            &round,
            &participants,
            "prompt",
            "pro-model",
            "fast-model",
            &mut blackboard,
            &control,
            &cumulative,
            Instant::now(),
            &out_tx,
        )
        .await;

        assert_eq!(outcome, RoundOutcome::Restart);
        assert!(benchmarks.is_empty());
        let ctx = blackboard.context_for(2, &[], |id| id.to_string());
        assert!(!ctx.contains("stale text"));
    }
}
