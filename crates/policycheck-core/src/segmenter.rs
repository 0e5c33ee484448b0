//! Document segmentation for block-level evaluation.
//!
//! Splits raw policy text into blocks that start at heading-like lines. The
//! heading test is a heuristic: a line made only of letters and whitespace
//! that starts with a capital, or a numbered-list marker (`12. ...`).
//! Ordinary prose lines without punctuation also look like headings and
//! start a new block. Checklist matching downstream tolerates this, so the
//! rule is kept loose on purpose.

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::TextBlock;

/// Minimum word count for a block to be sent to the oracle.
pub const DEFAULT_MIN_BLOCK_WORDS: usize = 8;

lazy_static! {
    /// Capitalized alphabetic phrase, or a numbered-list marker.
    static ref HEADING_PATTERN: Regex =
        Regex::new(r"^([A-Z][A-Za-z\s]+|[0-9]+\.\s.*)$").unwrap();
}

/// Whether a trimmed line opens a new block.
pub fn is_heading(line: &str) -> bool {
    HEADING_PATTERN.is_match(line)
}

/// Split raw text into blocks in document order.
///
/// Empty input yields no blocks. Text without any heading collapses into a
/// single block. Ids are assigned before any filtering.
pub fn segment(raw_text: &str) -> Vec<TextBlock> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in raw_text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() {
            continue;
        }

        if is_heading(stripped) && !current.is_empty() {
            chunks.push(current.join(" "));
            current.clear();
        }
        current.push(stripped);
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
        .into_iter()
        .enumerate()
        .map(|(i, text)| TextBlock {
            block_id: format!("B{}", i + 1),
            text,
        })
        .collect()
}

/// Whether a block carries enough words to hold a complete assertion.
pub fn is_valid_block(text: &str) -> bool {
    has_min_words(text, DEFAULT_MIN_BLOCK_WORDS)
}

/// Word-count filter with a custom threshold.
pub fn has_min_words(text: &str, min_words: usize) -> bool {
    text.split_whitespace().count() >= min_words
}

/// Segment and drop blocks shorter than `min_words`.
pub fn segment_for_evaluation(raw_text: &str, min_words: usize) -> Vec<TextBlock> {
    let blocks = segment(raw_text);
    let total = blocks.len();
    let kept: Vec<TextBlock> = blocks
        .into_iter()
        .filter(|b| has_min_words(&b.text, min_words))
        .collect();

    tracing::debug!(
        total_blocks = total,
        kept_blocks = kept.len(),
        min_words,
        "Segmented document"
    );

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_SECTIONS: &str = "Section One\nSome content here that is fairly long indeed.\nSection Two\nMore content also long enough to pass filter.";

    #[test]
    fn test_two_headings_yield_two_blocks() {
        let blocks = segment(TWO_SECTIONS);
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[0].text,
            "Section One Some content here that is fairly long indeed."
        );
        assert_eq!(
            blocks[1].text,
            "Section Two More content also long enough to pass filter."
        );
        assert_eq!(blocks[0].block_id, "B1");
        assert_eq!(blocks[1].block_id, "B2");
    }

    #[test]
    fn test_both_example_blocks_pass_filter() {
        let blocks = segment_for_evaluation(TWO_SECTIONS, DEFAULT_MIN_BLOCK_WORDS);
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_five_word_block_is_dropped() {
        assert!(!is_valid_block("Only five words are here"));
        assert!(is_valid_block("Now there are exactly eight words in this"));

        let text = "Contact Us\nEmail us any time.\nData Retention\nWe keep personal data only as long as the purpose requires.";
        let blocks = segment_for_evaluation(text, DEFAULT_MIN_BLOCK_WORDS);
        assert_eq!(blocks.len(), 1);
        // Ids are assigned before filtering
        assert_eq!(blocks[0].block_id, "B2");
    }

    #[test]
    fn test_empty_input_yields_no_blocks() {
        assert!(segment("").is_empty());
        assert!(segment("  \n\n \t\n").is_empty());
    }

    #[test]
    fn test_no_heading_collapses_to_one_block() {
        let text = "we collect your email.\nwe share it with partners.\nyou can opt out.";
        let blocks = segment(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(
            blocks[0].text,
            "we collect your email. we share it with partners. you can opt out."
        );
    }

    #[test]
    fn test_numbered_markers_start_blocks() {
        let text = "1. Consent\nWe ask before collecting.\n2. Withdrawal\nYou may withdraw.";
        let blocks = segment(text);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[1].text.starts_with("2. Withdrawal"));
    }

    #[test]
    fn test_leading_prose_before_first_heading() {
        let text = "preamble text, lowercase.\nPrivacy Policy\nbody.";
        let blocks = segment(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "preamble text, lowercase.");
        assert_eq!(blocks[1].text, "Privacy Policy body.");
    }

    #[test]
    fn test_unpunctuated_prose_line_is_treated_as_heading() {
        // Heuristic coupling: a capitalized sentence without punctuation
        // splits the block. Downstream fold over blocks tolerates this.
        let text = "Consent\nWe ask for consent.\nWe never sell your data\nto anyone at all.";
        let blocks = segment(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].text, "We never sell your data to anyone at all.");
    }

    #[test]
    fn test_heading_detection() {
        assert!(is_heading("Data Retention"));
        assert!(is_heading("3. Sharing with third parties, if any"));
        assert!(!is_heading("Data retention: 30 days"));
        assert!(!is_heading("lowercase heading"));
        assert!(!is_heading("3.Sharing"));
    }

    #[test]
    fn test_custom_threshold() {
        let blocks = segment_for_evaluation("Short One\ntiny.", 2);
        assert_eq!(blocks.len(), 1);
        let blocks = segment_for_evaluation("Short One\ntiny.", 4);
        assert!(blocks.is_empty());
    }
}
