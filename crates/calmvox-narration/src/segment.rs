//! Sentence segmentation for narration input.

use once_cell::sync::Lazy;
use regex::Regex;

static SENTENCE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+").expect("sentence boundary regex"));

/// Split `text` into trimmed, non-empty sentences.
///
/// Fragments are separated by runs of sentence-terminal punctuation (`.`,
/// `!`, `?`); the punctuation itself is not retained. Whitespace-only
/// fragments are discarded, so punctuation-only input yields an empty list.
/// Segmentation is pure: the same input always produces the same sequence.
pub fn segment_sentences(text: &str) -> Vec<String> {
    SENTENCE_BOUNDARY
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminal_punctuation() {
        assert_eq!(
            segment_sentences("Hello world. How are you? I am fine!"),
            vec!["Hello world", "How are you", "I am fine"]
        );
    }

    #[test]
    fn collapses_repeated_punctuation() {
        assert_eq!(
            segment_sentences("Wait... what?! Really."),
            vec!["Wait", "what", "Really"]
        );
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(
            segment_sentences("  First sentence.   Second one!  "),
            vec!["First sentence", "Second one"]
        );
    }

    #[test]
    fn empty_and_punctuation_only_input_yields_nothing() {
        assert!(segment_sentences("").is_empty());
        assert!(segment_sentences("   ").is_empty());
        assert!(segment_sentences("...!?.").is_empty());
    }

    #[test]
    fn text_without_terminators_is_one_sentence() {
        assert_eq!(segment_sentences("no punctuation here"), vec!["no punctuation here"]);
    }

    #[test]
    fn newlines_survive_inside_sentences() {
        assert_eq!(
            segment_sentences("line one\nline two. next"),
            vec!["line one\nline two", "next"]
        );
    }

    #[test]
    fn same_input_same_output() {
        let text = "One. Two! Three?";
        assert_eq!(segment_sentences(text), segment_sentences(text));
    }
}
