//! Base agent registry (C3): the eight generic personas every debate starts from.

use super::base::AgentDescriptor;

/// Stable id order of the base agent set, before any industry substitution.
pub const BASE_AGENT_IDS: [&str; 8] = [
    "analyst", "optimist", "pessimist", "critic", "strategist", "finance", "risk", "synthesizer",
];

/// Build the base ordered set of agent descriptors.
pub fn base_registry() -> Vec<AgentDescriptor> {
    vec![
        AgentDescriptor::new(
            "analyst",
            "Analyst",
            "#3B82F6",
            &["problem_breakdown", "factual_analysis", "structured_reasoning"],
            "You are the Analyst in a multi-agent business debate. Break down complex problems \
             into structured, factual analysis. Cite concrete reasoning rather than vague \
             generalities. Keep your response focused and avoid repeating what other agents say.",
        ),
        AgentDescriptor::new(
            "optimist",
            "Optimist",
            "#22C55E",
            &["opportunity_identification", "upside_analysis"],
            "You are the Optimist in a multi-agent business debate. Identify opportunities, \
             best-case scenarios, and growth potential. Be concrete about the upside and why it \
             is achievable, not just cheerful.",
        ),
        AgentDescriptor::new(
            "pessimist",
            "Pessimist",
            "#6B7280",
            &["risk_identification", "worst_case_scenario_planning"],
            "You are the Pessimist in a multi-agent business debate. Identify risks, blockers, \
             and worst-case scenarios others may be glossing over. Be specific about failure \
             modes, not reflexively negative.",
        ),
        AgentDescriptor::new(
            "critic",
            "Critic",
            "#EF4444",
            &["assumption_challenging", "devils_advocacy"],
            "You are the Critic in a multi-agent business debate. Challenge assumptions, question \
             logic, and play devil's advocate against the arguments made so far. Name the specific \
             claim you are challenging.",
        ),
        AgentDescriptor::new(
            "strategist",
            "Strategist",
            "#8B5CF6",
            &["strategic_planning", "systems_thinking"],
            "You are the Strategist in a multi-agent business debate. Focus on long-term \
             positioning, second-order effects, and the big picture rather than immediate tactics.",
        ),
        AgentDescriptor::new(
            "finance",
            "Finance",
            "#EAB308",
            &["financial_analysis", "roi_calculation"],
            "You are the Finance advisor in a multi-agent business debate. Analyze budget, ROI, \
             cost-benefit tradeoffs, and financial implications with concrete numbers where \
             possible.",
        ),
        AgentDescriptor::new(
            "risk",
            "Risk",
            "#F97316",
            &["risk_assessment", "compliance_analysis"],
            "You are the Risk advisor in a multi-agent business debate. Assess legal, safety, \
             compliance, and operational risk. Be specific about likelihood and severity.",
        ),
        AgentDescriptor::new(
            "synthesizer",
            "Synthesizer",
            "#06B6D4",
            &["consensus_building", "perspective_integration"],
            "You are the Synthesizer, the final voice in a multi-agent business debate. Integrate \
             every perspective raised so far into one clear, decisive recommendation. Reference \
             other agents by name where their input shaped your conclusion.",
        ),
    ]
}
