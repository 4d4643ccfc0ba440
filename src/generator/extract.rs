//! Best-effort JSON extraction from free-form model text.
//!
//! Models sometimes wrap the requested JSON object in prose or code fences.
//! Extraction is two-stage: take the input verbatim if it already starts
//! with a brace, otherwise strip fences and cut the outermost brace-delimited
//! object out of the surrounding text. Failure of the fallback is an explicit
//! error, never a silent empty result.

use super::GenerationError;

/// Extract the outermost JSON object from raw model output.
///
/// # Errors
///
/// Returns `GenerationError::Malformed` when no balanced object is found.
pub fn extract_json_object(raw: &str) -> Result<String, GenerationError> {
    let trimmed = strip_code_fences(raw.trim());

    let start = trimmed
        .find('{')
        .ok_or_else(|| GenerationError::Malformed("no JSON object in model output".to_string()))?;

    // Scan for the matching close brace, ignoring braces inside strings.
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in trimmed[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Ok(trimmed[start..=start + offset].to_string());
                }
            }
            _ => {}
        }
    }

    Err(GenerationError::Malformed(
        "unbalanced JSON object in model output".to_string(),
    ))
}

/// Remove a surrounding Markdown code fence (``` or ```json) if present.
fn strip_code_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag on the opening fence line
    let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
    rest.rsplit_once("```").map_or(rest, |(body, _)| body).trim()
}
