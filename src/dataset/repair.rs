//! Markdown-fence stripping and best-effort repair of dataset sources.

/// Remove a leading ```` ```json ```` (or ```` ``json ````) fence and a trailing
/// ```` ``` ```` fence from a source text.
pub fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();

    for fence in ["```json", "``json"] {
        let matches = text
            .get(..fence.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(fence));
        if matches {
            text = text[fence.len()..].trim_start();
            break;
        }
    }

    if let Some(rest) = text.strip_suffix("```") {
        text = rest.trim_end();
    }

    text
}

/// Outermost `[` ... `]` span of a text, if any.
pub fn outer_array_span(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if start >= end {
        return None;
    }
    Some(&text[start..=end])
}

fn non_empty_array(text: &str) -> Option<serde_json::Value> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) if value.as_array().is_some_and(|items| !items.is_empty()) => Some(value),
        _ => None,
    }
}

/// Outcome of repairing one source file.
#[derive(Debug, Clone, PartialEq)]
pub enum Repair {
    /// Already a valid non-empty array
    Valid(usize),
    /// Fixed; carries the canonical JSON text and item count
    Fixed(String, usize),
    /// Nothing usable could be recovered
    Unrecoverable,
}

/// Try progressively more aggressive fixes until the text is a non-empty array:
/// direct parse, fence stripping, outermost bracket extraction.
pub fn repair_source(raw: &str) -> Repair {
    if let Some(value) = non_empty_array(raw) {
        return Repair::Valid(value.as_array().map_or(0, Vec::len));
    }

    let stripped = strip_code_fence(raw);
    let candidate = non_empty_array(stripped)
        .or_else(|| outer_array_span(stripped).and_then(non_empty_array));

    match candidate {
        Some(value) => {
            let count = value.as_array().map_or(0, Vec::len);
            match serde_json::to_string_pretty(&value) {
                Ok(text) => Repair::Fixed(text, count),
                Err(_) => Repair::Unrecoverable,
            }
        }
        None => Repair::Unrecoverable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fenced_json() {
        let raw = "```json\n[{\"id\": 1}]\n```";
        assert_eq!(strip_code_fence(raw), "[{\"id\": 1}]");
    }

    #[test]
    fn test_strip_two_backtick_and_uppercase_fence() {
        assert_eq!(strip_code_fence("``json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```JSON [1] ```"), "[1]");
    }

    #[test]
    fn test_strip_leaves_plain_json_alone() {
        assert_eq!(strip_code_fence("  [1, 2]\n"), "[1, 2]");
    }

    #[test]
    fn test_outer_array_span() {
        assert_eq!(outer_array_span("Sure! [1, [2]] done"), Some("[1, [2]]"));
        assert_eq!(outer_array_span("] nope ["), None);
        assert_eq!(outer_array_span("no brackets"), None);
    }

    #[test]
    fn test_repair_valid_file_untouched() {
        assert_eq!(repair_source(r#"[{"id": 1}]"#), Repair::Valid(1));
    }

    #[test]
    fn test_repair_fenced_and_prose() {
        match repair_source("Here you go:\n```json\n[{\"id\": 1}, {\"id\": 2}]\n```") {
            Repair::Fixed(text, count) => {
                assert_eq!(count, 2);
                let value: serde_json::Value = serde_json::from_str(&text).unwrap();
                assert_eq!(value[1]["id"], 2);
            }
            other => panic!("expected Fixed, got {:?}", other),
        }
    }

    #[test]
    fn test_repair_gives_up_on_empty_or_object() {
        assert_eq!(repair_source("[]"), Repair::Unrecoverable);
        assert_eq!(repair_source(r#"{"id": 1}"#), Repair::Unrecoverable);
        assert_eq!(repair_source("garbage"), Repair::Unrecoverable);
    }
}
