//! Turning model output into game decisions.
//!
//! Nothing here fails: unusable output becomes the decision's safe default
//! and a warning in the logs. Players never see parse failures.

use llm::json::extract_json;
use llm::Completion;
use serde_json::Value;
use tracing::warn;

use crate::scheduler::PollResponse;

/// Sentinel a model returns to decline a target choice.
pub const ABSTAIN: &str = "ABSTAIN";

fn payload(completion: &Completion) -> Option<Value> {
    completion
        .structured
        .clone()
        .or_else(|| extract_json(&completion.content))
}

fn string_field(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Cut `text` to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// A target choice among `valid`. `None` means abstain, which is also what
/// invalid or missing targets become.
pub fn parse_target(completion: Option<&Completion>, player: &str, valid: &[String]) -> (Option<String>, String) {
    let Some(value) = completion.and_then(payload) else {
        if completion.is_some() {
            warn!(player = %player, "Unparseable target decision, abstaining");
        }
        return (None, String::new());
    };

    let reason = string_field(&value, "reasoning").unwrap_or_default();
    let target = match string_field(&value, "target") {
        None => None,
        Some(t) if t.eq_ignore_ascii_case(ABSTAIN) => None,
        Some(t) => match valid.iter().find(|v| v.eq_ignore_ascii_case(&t)) {
            Some(name) => Some(name.clone()),
            None => {
                warn!(player = %player, target = %t, "Invalid target, abstaining");
                None
            }
        },
    };

    (target, reason)
}

/// A turn-poll answer. The three flags are read as given; only output that
/// could not be parsed at all is a pass.
pub fn parse_poll(completion: Option<&Completion>, player: &str) -> PollResponse {
    let Some(value) = completion.and_then(payload) else {
        if completion.is_some() {
            warn!(player = %player, "Unparseable turn poll, passing");
        }
        return PollResponse::pass(player);
    };

    let flag = |field: &str| value.get(field).and_then(Value::as_bool).unwrap_or(false);

    PollResponse {
        player: player.to_string(),
        wants_to_interrupt: flag("wants_to_interrupt"),
        wants_to_respond: flag("wants_to_respond"),
        wants_to_pass: flag("wants_to_pass"),
    }
}

/// Free text from `field`, falling back to the raw content when the output
/// was not JSON at all.
pub fn parse_text(completion: Option<&Completion>, field: &str, max_chars: usize) -> Option<String> {
    let completion = completion?;
    let text = match payload(completion) {
        Some(value) => string_field(&value, field)?,
        None => completion.content.trim().to_string(),
    };

    if text.is_empty() {
        None
    } else {
        Some(truncate_chars(&text, max_chars))
    }
}

/// Speaker-declared urgency, clamped to 1..=10.
pub fn parse_priority(completion: Option<&Completion>) -> Option<u8> {
    let value = completion.and_then(payload)?;
    let raw = value.get("priority").and_then(Value::as_i64)?;
    Some(raw.clamp(1, 10) as u8)
}
