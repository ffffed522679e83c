use anyhow::{Context, Result, anyhow};
use serde::de::DeserializeOwned;

const PROMPT_PREFIX: &str = "optimized prompt:";

pub(crate) fn strip_think_blocks(input: &str) -> String {
    let mut cleaned = input.to_string();

    while let Some(think_start) = cleaned.find("<think>") {
        match cleaned[think_start..].find("</think>") {
            Some(think_end_pos) => {
                let absolute_end = think_start + think_end_pos + "</think>".len();
                cleaned.replace_range(think_start..absolute_end, "");
            }
            None => {
                cleaned.replace_range(think_start.., "");
                break;
            }
        }
    }

    cleaned.trim().to_string()
}

/// First balanced `{...}` in a model reply. Reasoning blocks are dropped and
/// braces inside JSON strings are ignored, so code fences around the object
/// do not matter.
pub(crate) fn extract_json_object(input: &str) -> Option<String> {
    let cleaned = strip_think_blocks(input);
    let start = cleaned.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (idx, ch) in cleaned[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + idx;
                    return Some(cleaned[start..=end].to_string());
                }
            }
            _ => {}
        }
    }

    None
}

pub(crate) fn parse_reply<T: DeserializeOwned>(content: &str, what: &str) -> Result<T> {
    let json_fragment = extract_json_object(content)
        .ok_or_else(|| anyhow!("{what} response did not contain a JSON object"))?;

    serde_json::from_str(&json_fragment)
        .with_context(|| format!("Failed to parse {what} JSON: {json_fragment}"))
}

/// Drops the `Optimized Prompt:` label the optimizer persona is asked to lead with.
pub(crate) fn strip_prompt_prefix(reply: &str) -> String {
    let cleaned = strip_think_blocks(reply);
    let prefix_len = PROMPT_PREFIX.len();
    let has_prefix = cleaned
        .get(..prefix_len)
        .is_some_and(|head| head.eq_ignore_ascii_case(PROMPT_PREFIX));

    if has_prefix {
        cleaned[prefix_len..].trim().to_string()
    } else {
        cleaned
    }
}
