//! Title cleanup for the two lesson topics.

use regex::Regex;
use std::sync::LazyLock;

/// Prefix every vocabulary upload title starts with.
pub const VOCABULARY_PREFIX: &str = "Learn English Vocabulary";
pub const CONVERSATION_MARKER: &str = "English Conversation";

static LESSON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<lesson>Lesson \d+)").expect("lesson pattern is valid"));

/// Drops the vocabulary prefix and the conversation marker.
///
/// The result is trimmed before the marker is removed, so a marker at either
/// end leaves its neighbouring space behind.
pub fn clean_vocabulary_title(title: &str) -> String {
    title
        .replace(VOCABULARY_PREFIX, "")
        .trim()
        .replace(CONVERSATION_MARKER, "")
}

/// Reduces a grammar title to its `Lesson N` part, or to the title without
/// the conversation marker when there is none.
pub fn clean_grammar_title(title: &str) -> String {
    let stripped = title.replace(CONVERSATION_MARKER, "");
    let stripped = stripped.trim();
    match LESSON_RE.captures(stripped) {
        Some(caps) => caps["lesson"].to_string(),
        None => stripped.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_prefix_and_marker_are_removed() {
        assert_eq!(
            clean_vocabulary_title("Learn English Vocabulary Food and Drinks"),
            "Food and Drinks"
        );
        assert_eq!(
            clean_vocabulary_title("Learn English Vocabulary English Conversation Shopping"),
            " Shopping"
        );
        assert_eq!(
            clean_vocabulary_title("Learn English Vocabulary Weather English Conversation"),
            "Weather "
        );
    }

    #[test]
    fn vocabulary_title_without_prefix_is_only_trimmed() {
        assert_eq!(clean_vocabulary_title("  Colors  "), "Colors");
    }

    #[test]
    fn grammar_title_keeps_lesson_number() {
        assert_eq!(
            clean_grammar_title("English Conversation Lesson 12 Present Perfect 3"),
            "Lesson 12"
        );
        assert_eq!(clean_grammar_title("Lesson 4"), "Lesson 4");
    }

    #[test]
    fn grammar_title_without_lesson_is_stripped() {
        assert_eq!(
            clean_grammar_title("English Conversation At the Airport 2"),
            "At the Airport 2"
        );
        assert_eq!(clean_grammar_title("Lessons learned"), "Lessons learned");
    }
}
