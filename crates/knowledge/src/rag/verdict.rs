//! Reading the model's "found in context" verdict.

use docqa_prompt::{FALLBACK_OFFER, VERDICT_TAG};

/// Model output with the verdict line removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Answer text shown to the user
    pub answer: String,

    /// The context did not answer the question
    pub not_found: bool,
}

/// Inspect raw model output.
///
/// A leading `FOUND_IN_CONTEXT: yes|no` line is stripped. The context is
/// treated as not answering when the tag says `no` or the answer carries the
/// fallback offer, whatever the tag says. A `no` verdict always ends with
/// the offer so the user sees the question.
pub fn inspect(output: &str) -> Verdict {
    let trimmed = output.trim_start();
    let (first_line, rest) = match trimmed.split_once('\n') {
        Some((line, rest)) => (line, rest),
        None => (trimmed, ""),
    };

    match parse_tag(first_line) {
        Some(found) => {
            let mut answer = rest.trim().to_string();
            if !found && !answer.contains(FALLBACK_OFFER) {
                if !answer.is_empty() {
                    answer.push_str("\n\n");
                }
                answer.push_str(FALLBACK_OFFER);
            }
            let not_found = !found || answer.contains(FALLBACK_OFFER);
            Verdict { answer, not_found }
        }
        None => Verdict {
            answer: output.trim().to_string(),
            not_found: output.contains(FALLBACK_OFFER),
        },
    }
}

fn parse_tag(line: &str) -> Option<bool> {
    let line = line.trim().trim_matches(|c| c == '*' || c == '`').trim();
    let (tag, value) = line.split_once(':')?;
    if !tag.trim().eq_ignore_ascii_case(VERDICT_TAG) {
        return None;
    }

    match value.trim().trim_end_matches('.').to_lowercase().as_str() {
        "yes" => Some(true),
        "no" => Some(false),
        _ => None,
    }
}
