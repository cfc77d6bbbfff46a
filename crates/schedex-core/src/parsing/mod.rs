pub mod repair;

use serde::Deserialize;
use tracing::{info, warn};

use crate::model::{ExtractionOutcome, PanelRecord};
use repair::{close_truncated_json, looks_truncated, strip_code_fences};

/// Characters of reply text quoted in parse-failure logs.
const LOG_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
struct ExtractionReply {
    panels: Option<Vec<PanelRecord>>,
}

/// Turn a model reply into an [`ExtractionOutcome`].
///
/// Formatting fences are stripped and an obviously truncated document is
/// closed before decoding. Never errors: anything unusable becomes
/// [`ExtractionOutcome::ParseFailure`] with the reason.
pub fn parse_extraction_reply(reply: &str) -> ExtractionOutcome {
    let text = prepare_reply(reply);
    if text.is_empty() {
        warn!("empty response from model");
        return ExtractionOutcome::ParseFailure("empty response".into());
    }

    let parsed: ExtractionReply = match serde_json::from_str(&text) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(
                error = %e,
                length = text.len(),
                head = %head(&text, LOG_EXCERPT_CHARS),
                tail = %tail(&text, LOG_EXCERPT_CHARS),
                "could not parse model reply as JSON"
            );
            return ExtractionOutcome::ParseFailure(e.to_string());
        }
    };

    let Some(panels) = parsed.panels else {
        warn!("model reply has no \"panels\" array");
        return ExtractionOutcome::ParseFailure("reply has no \"panels\" array".into());
    };

    if panels.is_empty() {
        return ExtractionOutcome::Empty;
    }

    let names: Vec<&str> = panels.iter().map(|p| p.display_name()).collect();
    info!("extracted panels: {}", names.join(", "));
    ExtractionOutcome::Extracted(panels)
}

/// Fence-stripped, trimmed, and (if needed) closed reply text.
pub(crate) fn prepare_reply(reply: &str) -> String {
    let text = strip_code_fences(reply);
    if !text.is_empty() && looks_truncated(text) {
        warn!("model reply appears incomplete, closing the JSON structure");
        return close_truncated_json(text);
    }
    text.to_string()
}

fn head(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn tail(s: &str, n: usize) -> String {
    let count = s.chars().count();
    s.chars().skip(count.saturating_sub(n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_PANEL: &str = r#"{"panels":[{"panel_header":{"panel_name":"PC-LP-01-01","main_rating":"400A MCB","voltage":"208Y/120","phase":"3","wire":"4","poles":"","kaic":"22,000","enclosure":"Type 1"},"circuits":[{"load_description":"Panel PC-LP-01-02","ocp_size":"250A","poles":"3","feeder":"","circuit_number":"1"},{"load_description":"Lighting","ocp_size":"20A","poles":"1","feeder":"","circuit_number":"2"}]}]}"#;

    #[test]
    fn plain_json_reply() {
        let outcome = parse_extraction_reply(ONE_PANEL);
        let panels = outcome.panels();
        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].panel_header.kaic, "22,000");
        assert_eq!(panels[0].circuits.len(), 2);
        assert_eq!(panels[0].circuits[1].load_description, "Lighting");
    }

    #[test]
    fn fenced_reply() {
        let fenced = format!("```json\n{ONE_PANEL}\n```\n");
        assert_eq!(parse_extraction_reply(&fenced).panels().len(), 1);

        let bare_fence = format!("```\n{ONE_PANEL}```");
        assert_eq!(parse_extraction_reply(&bare_fence).panels().len(), 1);
    }

    #[test]
    fn empty_panel_list_is_not_a_failure() {
        assert_eq!(
            parse_extraction_reply(r#"{"panels":[]}"#),
            ExtractionOutcome::Empty
        );
    }

    #[test]
    fn null_header_or_circuits_keep_the_other_panels() {
        let outcome = parse_extraction_reply(
            r#"{"panels":[{"panel_header":{"panel_name":"A"},"circuits":null},{"panel_header":null,"circuits":[{"load_description":"Spare"}]},{"panel_header":{"panel_name":"C"},"circuits":[]}]}"#,
        );
        let panels = outcome.panels();
        assert_eq!(panels.len(), 3);
        assert_eq!(panels[0].panel_header.panel_name, "A");
        assert!(panels[0].circuits.is_empty());
        assert_eq!(panels[1].display_name(), "Unknown");
        assert_eq!(panels[1].circuits[0].load_description, "Spare");
        assert_eq!(panels[2].panel_header.panel_name, "C");
    }

    #[test]
    fn missing_panels_key_is_a_failure() {
        assert!(parse_extraction_reply(r#"{"tables":[]}"#).is_failure());
    }

    #[test]
    fn blank_and_prose_replies_are_failures() {
        assert!(parse_extraction_reply("   ").is_failure());
        assert!(parse_extraction_reply("I could not find any panels.").is_failure());
    }

    #[test]
    fn truncated_reply_is_closed() {
        let truncated = r#"{"panels":[{"panel_header":{"panel_name":"A"},"circuits":[{"load_description":"Lights","ocp_size":"20A"},"#;
        let outcome = parse_extraction_reply(truncated);
        let panels = outcome.panels();
        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].panel_header.panel_name, "A");
        assert_eq!(panels[0].circuits.len(), 1);
        assert_eq!(panels[0].circuits[0].feeder, "");
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let outcome =
            parse_extraction_reply(r#"{"panels":[{"panel_header":{"panel_name":"LP-2"}}]}"#);
        let panel = &outcome.panels()[0];
        assert_eq!(panel.panel_header.voltage, "");
        assert!(panel.circuits.is_empty());
    }

    #[test]
    fn excerpts_respect_char_boundaries() {
        assert_eq!(head("ÅÄÖabc", 2), "ÅÄ");
        assert_eq!(tail("abcÅÄÖ", 2), "ÄÖ");
        assert_eq!(tail("ab", 5), "ab");
    }
}
