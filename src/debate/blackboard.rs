//! Blackboard (C5): the shared record of completed agent outputs, keyed by round,
//! that later rounds' prompts are built from.

use std::collections::BTreeMap;

/// Completed outputs for every round run so far, plus the agent display names used
/// to label each entry when rendering context for a later round.
#[derive(Default)]
pub struct Blackboard {
    rounds: BTreeMap<u32, Vec<(String, String)>>,
}

impl Blackboard {
    pub fn new() -> Self {
        Blackboard { rounds: BTreeMap::new() }
    }

    /// Record `agent_id`'s final text for `round_num`, in speaking order.
    pub fn put_final(&mut self, round_num: u32, agent_id: &str, text: &str) {
        self.rounds.entry(round_num).or_default().push((agent_id.to_string(), text.to_string()));
    }

    /// Discard everything recorded for `round_num`, used when a round restarts after
    /// a mid-round constraint injection.
    pub fn clear_round(&mut self, round_num: u32) {
        self.rounds.remove(&round_num);
    }

    /// Render every round strictly before `up_to_round` as debate context, followed
    /// by a constraints block that is always included (even for round 1, even when a
    /// constraint was injected mid-round) so agents mid-stream still see it.
    ///
    /// `agent_name` resolves an agent id to its display name for the `[Name]:` label.
    pub fn context_for(&self, up_to_round: u32, constraints: &[String], agent_name: impl Fn(&str) -> String) -> String {
        let mut parts: Vec<String> = Vec::new();

        for round_num in 1..up_to_round {
            let Some(entries) = self.rounds.get(&round_num) else { continue };
            parts.push(format!("=== ROUND {} ===", round_num));
            for (agent_id, text) in entries {
                let clean = strip_think_tags(text);
                parts.push(format!("\n[{}]:\n{}", agent_name(agent_id), clean));
            }
            parts.push(String::new());
        }

        if !constraints.is_empty() {
            parts.push("=== USER CONSTRAINTS (FOLLOW THESE!) ===".to_string());
            for (i, constraint) in constraints.iter().enumerate() {
                parts.push(format!("{}. {}", i + 1, constraint));
            }
            parts.push(String::new());
        }

        parts.join("\n")
    }
}

/// Strip `<think>...</think>` blocks, plus a trailing unterminated `<think>` tag (the
/// shape a truncated streaming buffer leaves behind), from reasoning-model output
/// before it is shown to other agents as context.
pub fn strip_think_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        match rest.find("<think>") {
            Some(start) => {
                out.push_str(&rest[..start]);
                let after = &rest[start + "<think>".len()..];
                match after.find("</think>") {
                    Some(end) => {
                        rest = &after[end + "</think>".len()..];
                    }
                    None => {
                        // Unterminated tag: drop everything from here to end of string.
                        rest = "";
                        break;
                    }
                }
            }
            None => {
                out.push_str(rest);
                rest = "";
                break;
            }
        }
    }
    let _ = rest;
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_complete_think_block() {
        let text = "before<think>internal musing</think>after";
        assert_eq!(strip_think_tags(text), "beforeafter");
    }

    #[test]
    fn strips_unterminated_trailing_think_block() {
        let text = "before<think>still thinking when truncated";
        assert_eq!(strip_think_tags(text), "before");
    }

    #[test]
    fn context_for_round_one_includes_only_constraints() {
        let bb = Blackboard::new();
        let constraints = vec!["Budget under $10k".to_string()];
        let ctx = bb.context_for(1, &constraints, |id| id.to_string());
        assert!(ctx.contains("=== USER CONSTRAINTS (FOLLOW THESE!) ==="));
        assert!(ctx.contains("1. Budget under $10k"));
        assert!(!ctx.contains("=== ROUND"));
    }

    #[test]
    fn context_for_later_round_includes_prior_rounds_labeled_by_name() {
        let mut bb = Blackboard::new();
        bb.put_final(1, "analyst", "My opening take.");
        bb.put_final(1, "optimist", "I see upside.");
        let ctx = bb.context_for(2, &[], |id| match id {
            "analyst" => "Analyst".to_string(),
            "optimist" => "Optimist".to_string(),
            other => other.to_string(),
        });
        assert!(ctx.contains("=== ROUND 1 ==="));
        assert!(ctx.contains("[Analyst]:\nMy opening take."));
        assert!(ctx.contains("[Optimist]:\nI see upside."));
    }

    #[test]
    fn clear_round_removes_only_that_round() {
        let mut bb = Blackboard::new();
        bb.put_final(1, "analyst", "keep me");
        bb.put_final(2, "critic", "drop me");
        bb.clear_round(2);
        let ctx = bb.context_for(3, &[], |id| id.to_string());
        assert!(ctx.contains("keep me"));
        assert!(!ctx.contains("drop me"));
    }
}
