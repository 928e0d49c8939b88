//! Benchmark accounting (part of C6): per-agent timing samples and the final
//! per-debate benchmark report attached to the `debate_complete` record.

use std::collections::BTreeMap;
use std::time::Instant;

/// Running timing state for one agent across one round, accumulated as tokens arrive.
#[derive(Default)]
pub struct AgentTiming {
    started: Option<Instant>,
    first_token: Option<Instant>,
    last_token: Option<Instant>,
    inter_token_gaps_secs: Vec<f64>,
    chunks: usize,
}

impl AgentTiming {
    pub fn mark_started(&mut self, at: Instant) {
        self.started = Some(at);
    }

    /// Record one token's arrival time, tracking time-to-first-token and the
    /// inter-token-latency sample set used for the p50/p95 report.
    pub fn mark_token(&mut self, at: Instant) {
        if self.first_token.is_none() {
            self.first_token = Some(at);
        } else if let Some(last) = self.last_token {
            self.inter_token_gaps_secs.push(at.duration_since(last).as_secs_f64());
        }
        self.last_token = Some(at);
        self.chunks += 1;
    }

    pub fn ttft_ms(&self) -> Option<i64> {
        match (self.started, self.first_token) {
            (Some(s), Some(f)) => Some((f.duration_since(s).as_secs_f64() * 1000.0).round() as i64),
            _ => None,
        }
    }

    pub fn avg_itl_ms(&self) -> Option<i64> {
        if self.inter_token_gaps_secs.is_empty() {
            return None;
        }
        let sum: f64 = self.inter_token_gaps_secs.iter().sum();
        Some((sum / self.inter_token_gaps_secs.len() as f64 * 1000.0).round() as i64)
    }

    pub fn p50_itl_ms(&self) -> Option<i64> {
        percentile(&self.inter_token_gaps_secs, 0.50).map(|v| (v * 1000.0).round() as i64)
    }

    pub fn p95_itl_ms(&self) -> Option<i64> {
        percentile(&self.inter_token_gaps_secs, 0.95).map(|v| (v * 1000.0).round() as i64)
    }

    pub fn chunks(&self) -> usize {
        self.chunks
    }
}

/// Nearest-rank percentile over a sample set; `None` for an empty set.
fn percentile(values: &[f64], pct: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut xs = values.to_vec();
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let idx = ((xs.len() - 1) as f64 * pct).round() as usize;
    Some(xs[idx.min(xs.len() - 1)])
}

/// API-reported usage/timing kept for the final benchmark, separate from the
/// wall-clock `AgentTiming` sampling above.
#[derive(Clone, Debug, Default)]
pub struct AgentApiMetrics {
    pub prompt_tokens: Option<usize>,
    pub completion_tokens: Option<usize>,
    pub total_tokens: Option<usize>,
    pub completion_time_secs: Option<f64>,
    pub tokens_per_second: Option<f64>,
}

/// Per-agent benchmark entry folded into the final `debate_complete.benchmark.agents` map.
#[derive(Clone, Debug)]
pub struct AgentBenchmark {
    pub round: u32,
    pub model: String,
    pub ttft_ms: Option<i64>,
    pub avg_itl_ms: Option<i64>,
    pub p50_itl_ms: Option<i64>,
    pub p95_itl_ms: Option<i64>,
    pub chunks: usize,
    pub api: AgentApiMetrics,
}

/// Per-round benchmark entry folded into the final `debate_complete.benchmark.rounds` map.
#[derive(Clone, Debug)]
pub struct RoundBenchmark {
    pub round: u32,
    pub name: &'static str,
    pub agents: Vec<String>,
    pub duration_ms: i64,
}

/// Accumulates the whole-debate benchmark report as rounds complete.
#[derive(Default)]
pub struct DebateBenchmark {
    /// Time from debate start to the very first token produced by any agent,
    /// in milliseconds. Set once, from the first round's agent benchmarks
    /// (chronologically earliest by construction).
    pub time_to_first_token_ms: Option<i64>,
    pub rounds: BTreeMap<u32, RoundBenchmark>,
    pub agents: BTreeMap<String, AgentBenchmark>,
}

impl DebateBenchmark {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the debate-wide time-to-first-token the first time it is observed.
    pub fn note_first_token_ms(&mut self, ms: i64) {
        if self.time_to_first_token_ms.is_none() {
            self.time_to_first_token_ms = Some(ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn percentile_handles_single_and_empty_samples() {
        assert_eq!(percentile(&[], 0.5), None);
        assert_eq!(percentile(&[0.1], 0.95), Some(0.1));
    }

    #[test]
    fn agent_timing_tracks_ttft_and_itl_gaps() {
        let mut timing = AgentTiming::default();
        let t0 = Instant::now();
        timing.mark_started(t0);
        timing.mark_token(t0 + Duration::from_millis(100));
        timing.mark_token(t0 + Duration::from_millis(150));
        timing.mark_token(t0 + Duration::from_millis(250));
        assert_eq!(timing.ttft_ms(), Some(100));
        assert_eq!(timing.chunks(), 3);
        assert!(timing.avg_itl_ms().is_some());
        assert!(timing.p50_itl_ms().is_some());
    }
}
