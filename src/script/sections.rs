//! Narration script section parsing.
//!
//! A narration script is a sequence of `#`-headed sections: the first line of
//! each section is its title, the rest is the text that gets narrated.

use crate::error::{FortellError, Result};
use crate::place::AudioScriptSection;

/// Split a narration script into its ordered, numbered sections.
///
/// Prose before the first `#` is discarded (scripts must start with a
/// header). The remainder is split on `#` and fragments that are empty after
/// trimming are dropped. Within a fragment, the text before the first
/// newline (trimmed) is the title and the remainder (trimmed) is the content.
///
/// A fragment with no newline, or with nothing after its first newline, is a
/// header without narration text; that is malformed input and fails with
/// `ScriptFormat` so empty text never reaches speech synthesis.
pub fn parse_sections(script: &str) -> Result<Vec<AudioScriptSection>> {
    // Anything before the first header is discarded, not treated as a
    // section: scripts must start with a header.
    let body = match script.find('#') {
        Some(start) => &script[start..],
        None => {
            return Err(FortellError::ScriptFormat(
                "script contains no '#'-headed sections".to_string(),
            ));
        }
    };

    let mut sections = Vec::new();

    for fragment in body.split('#') {
        if fragment.trim().is_empty() {
            continue;
        }

        let (title, content) = match fragment.split_once('\n') {
            Some((title, content)) => (title.trim(), content.trim()),
            None => {
                return Err(FortellError::ScriptFormat(format!(
                    "section '{}' has a title but no narration text",
                    fragment.trim()
                )));
            }
        };

        if content.is_empty() {
            return Err(FortellError::ScriptFormat(format!(
                "section '{}' has a title but no narration text",
                title
            )));
        }

        sections.push(AudioScriptSection {
            number: sections.len() + 1,
            title: title.to_string(),
            content: content.to_string(),
        });
    }

    if sections.is_empty() {
        return Err(FortellError::ScriptFormat(
            "script contains no '#'-headed sections".to_string(),
        ));
    }

    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_well_formed_sections() {
        let script = "# Intro\nWelcome text.\n# History\nHistory text.";
        let sections = parse_sections(script).unwrap();

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].number, 1);
        assert_eq!(sections[0].title, "Intro");
        assert_eq!(sections[0].content, "Welcome text.");
        assert_eq!(sections[1].number, 2);
        assert_eq!(sections[1].title, "History");
        assert_eq!(sections[1].content, "History text.");
    }

    #[test]
    fn test_numbering_follows_document_order() {
        let script = "# A\na\n# B\nb\n# C\nc";
        let sections = parse_sections(script).unwrap();
        let numbers: Vec<usize> = sections.iter().map(|s| s.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_multiline_content_trimmed() {
        let script = "#  The Gate  \n\nFirst paragraph.\n\nSecond paragraph.\n\n";
        let sections = parse_sections(script).unwrap();

        assert_eq!(sections[0].title, "The Gate");
        assert_eq!(sections[0].content, "First paragraph.\n\nSecond paragraph.");
    }

    #[test]
    fn test_prose_before_first_header_discarded() {
        let script = "ignored preamble\n# Intro\nWelcome.";
        let sections = parse_sections(script).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Intro");
        assert_eq!(sections[0].content, "Welcome.");
    }

    #[test]
    fn test_script_without_headers_is_malformed() {
        assert!(matches!(
            parse_sections("just prose, no headers"),
            Err(FortellError::ScriptFormat(_))
        ));
    }

    #[test]
    fn test_title_only_section_is_malformed() {
        assert!(matches!(
            parse_sections("# Intro"),
            Err(FortellError::ScriptFormat(_))
        ));
        assert!(matches!(
            parse_sections("# Intro\nWelcome.\n# Dangling"),
            Err(FortellError::ScriptFormat(_))
        ));
    }

    #[test]
    fn test_empty_script_is_malformed() {
        assert!(parse_sections("").is_err());
        assert!(parse_sections("   \n  ").is_err());
    }
}
