//! Candidate-span extraction: which regions of a body the skill matcher scans.

use crate::error::{InsightsError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const RULES: &str = "rules";
pub const PHRASES: &str = "phrases";
pub const STRATEGIES: &[&str] = &[RULES, PHRASES];

const FUNCTION_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "by", "for", "from", "in", "including", "into", "of", "on",
    "or", "such", "the", "to", "with", "within", "you", "your", "our", "we", "will", "is", "are",
    "be",
];

/// Byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

pub trait SpanExtractor: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract_candidate_spans(&self, text: &str) -> Vec<Span>;
}

/// The whole text as a single span; the lexicon matcher does the rest.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleBasedSpans;

impl SpanExtractor for RuleBasedSpans {
    fn name(&self) -> &'static str {
        RULES
    }

    fn extract_candidate_spans(&self, text: &str) -> Vec<Span> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        vec![Span {
            start: 0,
            end: text.len(),
        }]
    }
}

/// Heuristic noun-phrase chunker. Splits at clause punctuation, list
/// bullets, line breaks, and function words.
#[derive(Debug, Default, Clone, Copy)]
pub struct PhraseChunkSpans;

fn is_clause_break(c: char, next: Option<char>) -> bool {
    let next_is_gap = next.map_or(true, char::is_whitespace);
    match c {
        '\n' | '\r' | ';' | ':' | '!' | '?' | '(' | ')' | '[' | ']' | ',' | '|' | '"' => true,
        '•' | '·' | '●' | '▪' | '◦' => true,
        '.' | '-' | '*' | '–' | '—' => next_is_gap,
        _ => false,
    }
}

fn is_function_word(word: &str) -> bool {
    let bare = word
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    FUNCTION_WORDS.contains(&bare.as_str())
}

#[derive(Default)]
struct Chunker {
    spans: Vec<Span>,
    start: Option<usize>,
    end: usize,
}

impl Chunker {
    fn word(&mut self, text: &str, start: usize, end: usize) {
        if is_function_word(&text[start..end]) {
            self.flush();
        } else {
            self.start.get_or_insert(start);
            self.end = end;
        }
    }

    fn flush(&mut self) {
        if let Some(start) = self.start.take() {
            self.spans.push(Span {
                start,
                end: self.end,
            });
        }
    }
}

impl SpanExtractor for PhraseChunkSpans {
    fn name(&self) -> &'static str {
        PHRASES
    }

    fn extract_candidate_spans(&self, text: &str) -> Vec<Span> {
        let mut chunker = Chunker::default();
        let mut word_start: Option<usize> = None;
        let mut chars = text.char_indices().peekable();
        while let Some((pos, c)) = chars.next() {
            let next = chars.peek().map(|(_, n)| *n);
            let breaks = is_clause_break(c, next);
            if c.is_whitespace() || breaks {
                if let Some(start) = word_start.take() {
                    chunker.word(text, start, pos);
                }
                if breaks {
                    chunker.flush();
                }
            } else if word_start.is_none() {
                word_start = Some(pos);
            }
        }
        if let Some(start) = word_start {
            chunker.word(text, start, text.len());
        }
        chunker.flush();
        chunker.spans
    }
}

pub fn from_strategy(name: &str) -> Result<Arc<dyn SpanExtractor>> {
    match name {
        RULES => Ok(Arc::new(RuleBasedSpans)),
        PHRASES => Ok(Arc::new(PhraseChunkSpans)),
        other => Err(InsightsError::Validation(format!(
            "unknown span strategy '{other}', expected one of {STRATEGIES:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(text: &str) -> Vec<&str> {
        PhraseChunkSpans
            .extract_candidate_spans(text)
            .iter()
            .map(|s| s.text(text))
            .collect()
    }

    #[test]
    fn rule_based_returns_whole_text() {
        let text = "SQL, Python.";
        assert_eq!(
            RuleBasedSpans.extract_candidate_spans(text),
            vec![Span { start: 0, end: text.len() }]
        );
        assert!(RuleBasedSpans.extract_candidate_spans("   ").is_empty());
    }

    #[test]
    fn phrase_chunks_split_on_punctuation_and_function_words() {
        assert_eq!(
            chunks("Experience with SQL and Python, plus A/B testing."),
            vec!["Experience", "SQL", "Python", "plus A/B testing"]
        );
        assert_eq!(
            chunks("• Roadmap ownership\n- Stakeholder management; Node.js"),
            vec!["Roadmap ownership", "Stakeholder management", "Node.js"]
        );
    }

    #[test]
    fn phrase_chunks_keep_hyphenated_terms() {
        assert_eq!(
            chunks("Drive go-to-market for cross-functional teams"),
            vec!["Drive go-to-market", "cross-functional teams"]
        );
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        assert_eq!(from_strategy(PHRASES).unwrap().name(), PHRASES);
        assert!(matches!(
            from_strategy("llm"),
            Err(InsightsError::Validation(_))
        ));
    }
}
