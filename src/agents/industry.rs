//! Industry overlay (C3): per-industry specialist pairs that substitute for the
//! generic `finance`/`risk` slots, plus the display-info table used to keep the
//! client's UI in sync without a side-channel lookup.

use super::base::AgentDescriptor;
use super::registry::BASE_AGENT_IDS;

/// One industry's pair of specialist descriptors, in the order they replace
/// `finance` then `risk`.
pub struct IndustryAgents {
    pub industry: &'static str,
    pub specialists: [AgentDescriptor; 2],
}

fn descriptor(id: &str, name: &str, color: &str, prompt: &str) -> AgentDescriptor {
    AgentDescriptor::new(id, name, color, &["industry_analysis"], prompt)
}

/// Look up the specialist pair for a known industry key. Returns `None` for an
/// unrecognized key, which callers must treat as "no industry configured".
pub fn industry_agents(industry: &str) -> Option<IndustryAgents> {
    let pair = match industry {
        "saas" => (
            descriptor(
                "saas_metrics",
                "SaaS Metrics",
                "#3B82F6",
                "You are a SaaS metrics specialist. Analyze MRR, ARR, CAC, LTV, churn, and unit \
                 economics relevant to the question.",
            ),
            descriptor(
                "saas_growth",
                "Growth Strategy",
                "#10B981",
                "You are a SaaS growth strategist. Evaluate product-led growth, sales-led motion, \
                 pricing, and market positioning relevant to the question.",
            ),
        ),
        "ecommerce" => (
            descriptor(
                "ecommerce_conversion",
                "Conversion Expert",
                "#F59E0B",
                "You are an e-commerce conversion specialist. Analyze funnel optimization, CRO, \
                 and customer journey relevant to the question.",
            ),
            descriptor(
                "ecommerce_operations",
                "E-commerce Ops",
                "#8B5CF6",
                "You are an e-commerce operations specialist. Evaluate fulfillment, logistics, and \
                 supply chain relevant to the question.",
            ),
        ),
        "fintech" => (
            descriptor(
                "fintech_compliance",
                "Fintech Compliance",
                "#EF4444",
                "You are a fintech compliance specialist. Analyze regulatory, licensing, and \
                 compliance requirements relevant to the question.",
            ),
            descriptor(
                "fintech_risk",
                "Fintech Risk",
                "#F97316",
                "You are a fintech risk specialist. Evaluate fraud, credit risk, and security \
                 implications relevant to the question.",
            ),
        ),
        "healthcare" => (
            descriptor(
                "healthcare_clinical",
                "Clinical Expert",
                "#06B6D4",
                "You are a clinical expert. Analyze clinical evidence, patient outcomes, and care \
                 pathways relevant to the question.",
            ),
            descriptor(
                "healthcare_regulatory",
                "Healthcare Regulatory",
                "#EC4899",
                "You are a healthcare regulatory specialist. Evaluate HIPAA, FDA, and healthcare \
                 compliance relevant to the question.",
            ),
        ),
        "manufacturing" => (
            descriptor(
                "manufacturing_operations",
                "Manufacturing Ops",
                "#6366F1",
                "You are a manufacturing operations specialist. Analyze production efficiency, \
                 lean practices, and supply chain relevant to the question.",
            ),
            descriptor(
                "manufacturing_quality",
                "Quality & Compliance",
                "#14B8A6",
                "You are a manufacturing quality specialist. Evaluate ISO standards, safety, and \
                 quality compliance relevant to the question.",
            ),
        ),
        "consulting" => (
            descriptor(
                "consulting_client",
                "Client Strategy",
                "#A855F7",
                "You are a client strategy consultant. Analyze client relationships and business \
                 development relevant to the question.",
            ),
            descriptor(
                "consulting_delivery",
                "Delivery Expert",
                "#22C55E",
                "You are a delivery expert consultant. Evaluate project delivery, resourcing, and \
                 utilization relevant to the question.",
            ),
        ),
        _ => return None,
    };
    Some(IndustryAgents {
        industry: match industry {
            "saas" => "saas",
            "ecommerce" => "ecommerce",
            "fintech" => "fintech",
            "healthcare" => "healthcare",
            "manufacturing" => "manufacturing",
            "consulting" => "consulting",
            _ => unreachable!(),
        },
        specialists: [pair.0, pair.1],
    })
}

/// Base agent ids with `finance`/`risk` positionally replaced by the industry's
/// specialist ids, mirroring the original system's `get_industry_agent_ids`.
pub fn agent_ids_for_industry(industry: Option<&str>) -> Vec<String> {
    let overlay = industry.and_then(industry_agents);
    BASE_AGENT_IDS
        .iter()
        .map(|&id| match (&overlay, id) {
            (Some(ov), "finance") => ov.specialists[0].id.clone(),
            (Some(ov), "risk") => ov.specialists[1].id.clone(),
            _ => id.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_industry_is_treated_as_absent() {
        assert!(industry_agents("not-a-real-industry").is_none());
        assert_eq!(
            agent_ids_for_industry(Some("not-a-real-industry")),
            BASE_AGENT_IDS.to_vec()
        );
    }

    #[test]
    fn saas_replaces_finance_and_risk_positionally() {
        let ids = agent_ids_for_industry(Some("saas"));
        assert_eq!(
            ids,
            vec![
                "analyst", "optimist", "pessimist", "critic", "strategist", "saas_metrics",
                "saas_growth", "synthesizer",
            ]
        );
    }
}
