//! Prompt templates for common decision categories.
//!
//! Each helper returns a pre-filled [`QuestionBuilder`]; callers still add
//! participants and policy before building. IDs are derived from the inputs
//! so the same decision asked twice maps to the same audit key.

use crate::consensus::question::{ConsensusQuestion, DecisionContext, QuestionBuilder};
use crate::core::Hash256;

fn derived_id(prefix: &str, parts: &[&str]) -> String {
    let chunks: Vec<&[u8]> = parts
        .iter()
        .flat_map(|p| [p.as_bytes(), b"\x1f".as_slice()])
        .collect();
    let hash = Hash256::digest(&chunks);
    format!("{}_{}", prefix, &hash.to_hex()[..12])
}

/// YES keeps the first candidate; NO prefers an alternative.
pub fn tool_selection(candidates: &[&str], task_description: &str) -> QuestionBuilder {
    let tools = candidates.join(", ");
    let mut id_parts = vec![task_description];
    id_parts.extend_from_slice(candidates);

    ConsensusQuestion::builder(format!(
        "Task: {}\n\n\
         Candidate tools: {}\n\n\
         Vote YES if you believe the PRIMARY candidate (first tool) is the best choice. \
         Vote NO if you believe an alternative is better. \
         Provide confidence as a decimal 0.0-1.0 based on your expertise in this domain.",
        task_description, tools
    ))
    .id(derived_id("tool_select", &id_parts))
    .context(DecisionContext::ToolSelection)
}

/// YES approves the first option; NO prefers another.
pub fn budget_allocation(options: &[(&str, &str)], constraint: &str) -> QuestionBuilder {
    let listing = options
        .iter()
        .map(|(name, desc)| format!("  - {}: {}", name, desc))
        .collect::<Vec<_>>()
        .join("\n");
    let mut id_parts = vec![constraint];
    id_parts.extend(options.iter().map(|(name, _)| *name));

    ConsensusQuestion::builder(format!(
        "Budget decision. Constraint: {}\n\n\
         Options:\n{}\n\n\
         Vote YES to approve the PRIMARY option (first listed). \
         Vote NO if you believe a different option better serves the constraint. \
         Confidence: how certain are you about this decision (0.0-1.0)?",
        constraint, listing
    ))
    .id(derived_id("budget", &id_parts))
    .context(DecisionContext::BudgetAllocation)
}

/// YES sides with interpretation A, NO with interpretation B.
pub fn interpretation_dispute(
    disputed_text: &str,
    interpretation_a: &str,
    interpretation_b: &str,
) -> QuestionBuilder {
    ConsensusQuestion::builder(format!(
        "Interpretation dispute:\n\n\
         Text: {}\n\n\
         Interpretation A: {}\n\
         Interpretation B: {}\n\n\
         Vote YES if Interpretation A is correct. \
         Vote NO if Interpretation B is correct. \
         Confidence: how confident are you (0.0-1.0)?",
        disputed_text, interpretation_a, interpretation_b
    ))
    .id(derived_id(
        "interp",
        &[disputed_text, interpretation_a, interpretation_b],
    ))
    .context(DecisionContext::InterpretationDispute)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_selection() {
        let question = tool_selection(&["REST", "GraphQL"], "Serve product data")
            .participants(["backend", "frontend"])
            .build()
            .unwrap();

        assert!(question.question_id.starts_with("tool_select_"));
        assert_eq!(question.context, DecisionContext::ToolSelection);
        assert!(question.prompt.contains("Candidate tools: REST, GraphQL"));
        assert!(question.prompt.contains("Task: Serve product data"));
    }

    #[test]
    fn test_ids_are_stable_and_input_sensitive() {
        let a = tool_selection(&["REST", "GraphQL"], "t").participant("x").build().unwrap();
        let b = tool_selection(&["REST", "GraphQL"], "t").participant("x").build().unwrap();
        let c = tool_selection(&["GraphQL", "REST"], "t").participant("x").build().unwrap();
        assert_eq!(a.question_id, b.question_id);
        assert_ne!(a.question_id, c.question_id);
    }

    #[test]
    fn test_budget_allocation() {
        let question = budget_allocation(
            &[("reserved", "1-year commitment"), ("spot", "cheap but preemptible")],
            "stay under $10k/month",
        )
        .participant("finance")
        .build()
        .unwrap();

        assert!(question.question_id.starts_with("budget_"));
        assert!(question.prompt.contains("  - reserved: 1-year commitment"));
        assert!(question.prompt.contains("  - spot: cheap but preemptible"));
    }

    #[test]
    fn test_interpretation_dispute() {
        let question = interpretation_dispute("must be fast", "p99 < 100ms", "p50 < 100ms")
            .participant("pm")
            .build()
            .unwrap();

        assert!(question.question_id.starts_with("interp_"));
        assert_eq!(question.context, DecisionContext::InterpretationDispute);
        assert!(question.prompt.contains("Interpretation B: p50 < 100ms"));
    }
}
