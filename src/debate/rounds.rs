//! Round planner (C4): turns a resolved agent set into the ordered sequence of
//! rounds a debate will actually run, pruning rounds whose participants were not
//! selected and always finishing on the synthesizer's verdict.

/// One scheduled round: which agents speak, and what they're asked to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebateRound {
    pub round_num: u32,
    pub name: &'static str,
    pub agents: Vec<String>,
    pub context_prompt: String,
}

const OPENING_PROMPT: &str =
    "You are presenting your OPENING POSITION on this topic. Be clear and take a stance.";
const CHALLENGE_PROMPT: &str = "You are CHALLENGING the opening arguments. Directly address the \
     previous speakers' specific claims. Quote them and explain why they're wrong or incomplete.";
const DEFENSE_PROMPT: &str = "You are DEFENDING your position against the challengers' attacks. \
     Address their specific objections. Acknowledge valid points but explain why your core \
     argument still holds.";
const VERDICT_PROMPT: &str = "The debate is complete. Synthesize ALL rounds into a final verdict. \
     Note who 'won' each exchange, what was resolved, and what remains contested. Provide a clear \
     recommendation.";

/// Human-facing label for an industry key, used both in the Expert Analysis round's
/// context prompt and in the orchestrator's `INDUSTRY CONTEXT:` prompt block.
pub fn industry_label(industry: &str) -> &str {
    match industry {
        "saas" => "SaaS/Software",
        "ecommerce" => "E-commerce/Retail",
        "fintech" => "Fintech/Banking",
        "healthcare" => "Healthcare/Biotech",
        "manufacturing" => "Manufacturing",
        "consulting" => "Consulting/Agency",
        other => other,
    }
}

/// Build the ordered round plan for a resolved agent id set and optional industry.
///
/// Rounds with no participating agents are dropped entirely: a Challenge round with
/// no selected challenger is pointless, and dropping it also skips the Defense round
/// that would otherwise follow it (there is nothing to defend against). Round numbers
/// are renumbered contiguously from 1 after pruning. The Final Verdict round is
/// included iff `synthesizer` is present in `resolved_ids` — callers that went through
/// [`super::super::agents::resolve_agent_ids`] always have it.
pub fn build_debate_rounds(resolved_ids: &[String], industry: Option<&str>) -> Vec<DebateRound> {
    let selected: std::collections::HashSet<&str> = resolved_ids.iter().map(|s| s.as_str()).collect();
    let mut rounds = Vec::new();
    let mut round_num: u32 = 1;

    let opening_agents: Vec<String> = ["analyst", "optimist"]
        .into_iter()
        .filter(|a| selected.contains(a))
        .map(String::from)
        .collect();
    let had_opening = !opening_agents.is_empty();
    if had_opening {
        rounds.push(DebateRound {
            round_num,
            name: "Opening Arguments",
            agents: opening_agents,
            context_prompt: OPENING_PROMPT.to_string(),
        });
        round_num += 1;
    }

    let challenge_agents: Vec<String> = ["critic", "pessimist"]
        .into_iter()
        .filter(|a| selected.contains(a))
        .map(String::from)
        .collect();
    if !challenge_agents.is_empty() && had_opening {
        rounds.push(DebateRound {
            round_num,
            name: "Challenge",
            agents: challenge_agents,
            context_prompt: CHALLENGE_PROMPT.to_string(),
        });
        round_num += 1;

        let defense_agents: Vec<String> = ["analyst", "optimist"]
            .into_iter()
            .filter(|a| selected.contains(a))
            .map(String::from)
            .collect();
        if !defense_agents.is_empty() {
            rounds.push(DebateRound {
                round_num,
                name: "Defense & Rebuttal",
                agents: defense_agents,
                context_prompt: DEFENSE_PROMPT.to_string(),
            });
            round_num += 1;
        }
    }

    // Expert Analysis: strategist plus either the generic finance/risk pair or the
    // industry-specific specialist pair substituted for them.
    let mut expert_base: Vec<String> = vec!["strategist".to_string()];
    let overlay = industry.and_then(crate::agents::industry::industry_agents);
    if let Some(ov) = &overlay {
        expert_base.push(ov.specialists[0].id.clone());
        expert_base.push(ov.specialists[1].id.clone());
    } else {
        expert_base.push("finance".to_string());
        expert_base.push("risk".to_string());
    }
    let expert_agents: Vec<String> = expert_base.into_iter().filter(|a| selected.contains(a.as_str())).collect();
    if !expert_agents.is_empty() {
        let industry_prompt = industry
            .map(|ind| format!(" Apply your {} expertise specifically.", industry_label(ind)))
            .unwrap_or_default();
        rounds.push(DebateRound {
            round_num,
            name: "Expert Analysis",
            agents: expert_agents,
            context_prompt: format!(
                "You've watched the debate unfold. Now provide your EXPERT PERSPECTIVE. Reference \
                 the back-and-forth between the other agents. Who had the stronger arguments? What \
                 did they miss?{}",
                industry_prompt
            ),
        });
        round_num += 1;
    }

    if selected.contains("synthesizer") {
        rounds.push(DebateRound {
            round_num,
            name: "Final Verdict",
            agents: vec!["synthesizer".to_string()],
            context_prompt: VERDICT_PROMPT.to_string(),
        });
    }

    rounds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_roster_produces_all_five_rounds_in_order() {
        let ids: Vec<String> = [
            "analyst", "optimist", "pessimist", "critic", "strategist", "finance", "risk", "synthesizer",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let rounds = build_debate_rounds(&ids, None);
        let names: Vec<&str> = rounds.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec!["Opening Arguments", "Challenge", "Defense & Rebuttal", "Expert Analysis", "Final Verdict"]
        );
        let nums: Vec<u32> = rounds.iter().map(|r| r.round_num).collect();
        assert_eq!(nums, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn no_challengers_skips_challenge_and_defense() {
        let ids: Vec<String> = ["analyst", "optimist", "strategist", "finance", "risk", "synthesizer"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rounds = build_debate_rounds(&ids, None);
        let names: Vec<&str> = rounds.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Opening Arguments", "Expert Analysis", "Final Verdict"]);
        let nums: Vec<u32> = rounds.iter().map(|r| r.round_num).collect();
        assert_eq!(nums, vec![1, 2, 3]);
    }

    #[test]
    fn synthesizer_only_selection_is_just_final_verdict() {
        let ids = vec!["synthesizer".to_string()];
        let rounds = build_debate_rounds(&ids, None);
        assert_eq!(rounds.len(), 1);
        assert_eq!(rounds[0].round_num, 1);
        assert_eq!(rounds[0].name, "Final Verdict");
    }

    #[test]
    fn industry_overlay_substitutes_expert_round_and_appends_sentence() {
        let ids: Vec<String> = ["strategist", "saas_metrics", "saas_growth", "synthesizer"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rounds = build_debate_rounds(&ids, Some("saas"));
        let expert = rounds.iter().find(|r| r.name == "Expert Analysis").unwrap();
        assert_eq!(expert.agents, vec!["strategist", "saas_metrics", "saas_growth"]);
        assert!(expert.context_prompt.contains("SaaS/Software expertise specifically."));
    }

    #[test]
    fn challenge_without_opening_agents_is_dropped() {
        // Opening agents not selected at all: a challenge round would have nothing to challenge.
        let ids: Vec<String> = ["critic", "pessimist", "synthesizer"].iter().map(|s| s.to_string()).collect();
        let rounds = build_debate_rounds(&ids, None);
        let names: Vec<&str> = rounds.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Final Verdict"]);
    }
}
