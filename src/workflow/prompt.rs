//! Prompt substitution from prior round results.

use crate::consensus::ConsensusResult;
use crate::core::{Error, Result};

/// Value rendered for a `{previous_*}` placeholder when there is nothing to
/// refer to.
pub const NONE_PLACEHOLDER: &str = "NONE";

/// Fill placeholders in `template` from the most recent result in `prior`.
///
/// Supported placeholders:
///
/// | placeholder             | value                                        |
/// |-------------------------|----------------------------------------------|
/// | `{previous_decision}`   | `YES` / `NO` / `ABSTAIN`, `NONE` if undecided |
/// | `{previous_score}`      | weighted score, two decimals                 |
/// | `{previous_confidence}` | confidence level, three decimals             |
/// | `{previous_question}`   | question ID                                  |
/// | `{round}`               | 1-based number of the round being rendered   |
///
/// With no prior result every `previous_*` placeholder renders as `NONE`.
/// `{{` and `}}` produce literal braces. An unknown or unterminated
/// placeholder is an [`Error::Template`].
pub fn render_prompt(template: &str, prior: &[ConsensusResult]) -> Result<String> {
    let last = prior.last();
    let mut output = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                output.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                output.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => name.push(c),
                        None => {
                            return Err(Error::Template(format!(
                                "unterminated placeholder {{{}",
                                name
                            )))
                        }
                    }
                }
                output.push_str(&lookup(&name, last, prior.len() + 1)?);
            }
            '}' => return Err(Error::Template("unmatched '}' in prompt".to_string())),
            c => output.push(c),
        }
    }

    Ok(output)
}

fn lookup(name: &str, last: Option<&ConsensusResult>, round: usize) -> Result<String> {
    let value = match (name, last) {
        ("round", _) => round.to_string(),
        ("previous_decision", Some(result)) => result
            .final_decision
            .map(|d| d.as_str().to_string())
            .unwrap_or_else(|| NONE_PLACEHOLDER.to_string()),
        ("previous_score", Some(result)) => format!("{:.2}", result.weighted_score),
        ("previous_confidence", Some(result)) => format!("{:.3}", result.confidence_level),
        ("previous_question", Some(result)) => result.question_id.clone(),
        ("previous_decision" | "previous_score" | "previous_confidence" | "previous_question", None) => {
            NONE_PLACEHOLDER.to_string()
        }
        _ => {
            return Err(Error::Template(format!(
                "unknown placeholder {{{}}}",
                name
            )))
        }
    };
    Ok(value)
}
