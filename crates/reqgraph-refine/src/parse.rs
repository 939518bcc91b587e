use reqgraph_core::RequirementsSummary;

use crate::error::RefineError;

/// Parse raw LLM output into a summary.
///
/// Accepts the object on its own, wrapped in prose or code fences, or nested
/// under a top-level `"summary"` key.
pub fn parse_summary(raw: &str) -> Result<RequirementsSummary, RefineError> {
    let json_str = extract_json_object(raw).ok_or(RefineError::NoJson)?;

    // Try the outermost object first
    match parse_value(json_str) {
        Ok(summary) => Ok(summary),
        Err(first) => {
            // Fall back to the first balanced top-level object with content
            top_level_objects(raw)
                .into_iter()
                .filter_map(|obj| parse_value(obj).ok())
                .find(|summary| *summary != RequirementsSummary::default())
                .ok_or(first)
        }
    }
}

fn parse_value(json_str: &str) -> Result<RequirementsSummary, RefineError> {
    let mut value: serde_json::Value = serde_json::from_str(json_str)?;
    if let Some(inner) = value.get_mut("summary").filter(|v| v.is_object()) {
        value = inner.take();
    }
    Ok(serde_json::from_value(value)?)
}

/// Extract the outermost JSON object substring from raw LLM output.
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Balanced `{...}` spans at depth zero, skipping braces inside strings.
fn top_level_objects(raw: &str) -> Vec<&str> {
    let mut objects = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in raw.char_indices() {
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
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        objects.push(&raw[s..=i]);
                    }
                }
            }
            _ => {}
        }
    }

    objects
}
