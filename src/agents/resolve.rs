//! Resolution (C3): `(industry, requested_agents)` → concrete ordered agent set.

use std::sync::Arc;

use super::base::{Agent, AgentDescriptor};
use super::industry::agent_ids_for_industry;
use super::registry::base_registry;
use crate::client::wrapper::ChatStreamClient;

/// Resolve the ordered set of agent descriptors for a debate, per §4.3:
/// 1. start from the base set with industry substitution applied;
/// 2. intersect with `requested_agents` (preserving base order) when non-empty;
/// 3. always force `synthesizer` into the result.
pub fn resolve_agent_ids(industry: Option<&str>, requested_agents: &[String]) -> Vec<String> {
    let overlaid = agent_ids_for_industry(industry);
    let overlay = industry.and_then(super::industry::industry_agents);

    let resolved: Vec<String> = if requested_agents.is_empty() {
        overlaid
    } else {
        // A caller may still name the generic "finance"/"risk" slots even when an
        // industry is configured; map those through the same substitution before
        // intersecting so the request lines up with the overlaid id list.
        let requested: std::collections::HashSet<String> = requested_agents
            .iter()
            .map(|id| match (&overlay, id.as_str()) {
                (Some(ov), "finance") => ov.specialists[0].id.clone(),
                (Some(ov), "risk") => ov.specialists[1].id.clone(),
                _ => id.clone(),
            })
            .collect();
        overlaid
            .into_iter()
            .filter(|id| requested.contains(id.as_str()))
            .collect()
    };

    if resolved.iter().any(|id| id == "synthesizer") {
        resolved
    } else {
        let mut with_synth = resolved;
        with_synth.push("synthesizer".to_string());
        with_synth
    }
}

/// Build concrete [`Agent`] instances for a resolved id list, sharing one upstream
/// client across every agent in the debate.
pub fn build_agents(
    resolved_ids: &[String],
    industry: Option<&str>,
    client: Arc<dyn ChatStreamClient>,
) -> Vec<Agent> {
    let base: Vec<AgentDescriptor> = base_registry();
    let industry_specialists: Vec<AgentDescriptor> = industry
        .and_then(super::industry::industry_agents)
        .map(|ov| ov.specialists.to_vec())
        .unwrap_or_default();

    resolved_ids
        .iter()
        .filter_map(|id| {
            base.iter()
                .find(|d| &d.id == id)
                .or_else(|| industry_specialists.iter().find(|d| &d.id == id))
                .cloned()
                .map(|descriptor| Agent::new(descriptor, client.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_selection_means_all() {
        let resolved = resolve_agent_ids(None, &[]);
        assert_eq!(resolved.len(), 8);
        assert_eq!(resolved.last().unwrap(), "synthesizer");
    }

    #[test]
    fn synthesizer_only_selection_is_forced_and_alone() {
        let requested = vec!["synthesizer".to_string()];
        let resolved = resolve_agent_ids(None, &requested);
        assert_eq!(resolved, vec!["synthesizer".to_string()]);
    }

    #[test]
    fn synthesizer_is_forced_even_if_not_requested() {
        let requested = vec!["analyst".to_string()];
        let resolved = resolve_agent_ids(None, &requested);
        assert_eq!(resolved, vec!["analyst".to_string(), "synthesizer".to_string()]);
    }

    #[test]
    fn industry_override_substitutes_before_intersection() {
        let requested = vec!["analyst".to_string(), "finance".to_string(), "synthesizer".to_string()];
        let resolved = resolve_agent_ids(Some("saas"), &requested);
        assert_eq!(
            resolved,
            vec!["analyst".to_string(), "saas_metrics".to_string(), "synthesizer".to_string()]
        );
    }
}
