/// Remove a leading ```` ```json ```` / ```` ``` ```` fence and a trailing
/// ```` ``` ````, then trim.
pub fn strip_code_fences(reply: &str) -> &str {
    let mut text = reply.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    }
    if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// A complete document ends with `}` or `]`.
pub fn looks_truncated(text: &str) -> bool {
    !(text.ends_with('}') || text.ends_with(']'))
}

/// Close a reply cut off inside the circuit list of the last panel.
///
/// Only the common case is handled: the cut falls between two circuit
/// objects. Other cuts still fail to decode and are reported as such.
pub fn close_truncated_json(text: &str) -> String {
    format!("{}]}}]}}", text.trim_end_matches(','))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_code_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  ```\n[]```  "), "[]");
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn truncation_check() {
        assert!(!looks_truncated("{}"));
        assert!(!looks_truncated("[1]"));
        assert!(looks_truncated("{\"a\":[1,"));
    }

    #[test]
    fn closing_appends_list_and_object_terminators() {
        assert_eq!(close_truncated_json("{\"x\":[{},"), "{\"x\":[{}]}]}");
    }
}
