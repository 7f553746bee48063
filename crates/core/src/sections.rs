//! Bulleted list extraction: responsibilities, qualifications, and
//! nice-to-have items listed under their headings.
//!
//! Works on raw lines since normalization folds line breaks away.

use crate::lexicon::{contains_term, normalize};
use crate::models::DocumentSections;

pub const MAX_ITEM_CHARS: usize = 200;
const MAX_LISTED: usize = 20;
const MAX_NICE_TO_HAVE: usize = 10;
const MIN_LISTED_CHARS: usize = 20;
const MIN_NICE_TO_HAVE_CHARS: usize = 10;
/// Lines longer than this are prose unless they end with a colon.
const MAX_HEADING_WORDS: usize = 6;

const BULLETS: &[char] = &['-', '*', '•', '·', '●', '▪', '◦', '–'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Responsibilities,
    Qualifications,
    NiceToHave,
}

// Checked in order: "preferred qualifications" heads a nice-to-have list.
const HEADINGS: &[(Section, &[&str])] = &[
    (
        Section::NiceToHave,
        &["nice to have", "nice-to-have", "preferred", "bonus", "ideal candidate"],
    ),
    (
        Section::Responsibilities,
        &["responsibilities", "duties", "what youll do", "what you will do", "your impact"],
    ),
    (
        Section::Qualifications,
        &[
            "qualifications",
            "requirements",
            "must have",
            "must-have",
            "what you bring",
            "what youll bring",
            "you have",
            "what were looking for",
            "who you are",
        ],
    ),
];

/// Collects bullet items under recognized headings. A non-bullet line that
/// is not a recognized heading closes the current list; blank lines do not.
pub fn extract_sections(body: &str) -> DocumentSections {
    let mut sections = DocumentSections::default();
    let mut current = None;
    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match bullet_item(line) {
            Some(item) => {
                if let Some(section) = current {
                    push_item(&mut sections, section, item);
                }
            }
            None => current = heading(line),
        }
    }
    sections
}

fn heading(line: &str) -> Option<Section> {
    let text = normalize(line);
    if !line.ends_with(':') && text.split(' ').count() > MAX_HEADING_WORDS {
        return None;
    }
    HEADINGS
        .iter()
        .find(|(_, terms)| terms.iter().any(|t| contains_term(&text, t)))
        .map(|(section, _)| *section)
}

/// Text after a list marker (`-`, `•`, `1.`, `2)` ...) followed by whitespace.
fn bullet_item(line: &str) -> Option<&str> {
    let first = line.chars().next()?;
    let rest = if BULLETS.contains(&first) {
        &line[first.len_utf8()..]
    } else if first.is_ascii_digit() {
        let digits_end = line.find(|c: char| !c.is_ascii_digit())?;
        if !matches!(line[digits_end..].chars().next(), Some('.') | Some(')')) {
            return None;
        }
        &line[digits_end + 1..]
    } else {
        return None;
    };
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim())
}

fn push_item(sections: &mut DocumentSections, section: Section, item: &str) {
    let (list, cap, min_chars) = match section {
        Section::Responsibilities => (&mut sections.responsibilities, MAX_LISTED, MIN_LISTED_CHARS),
        Section::Qualifications => (&mut sections.qualifications, MAX_LISTED, MIN_LISTED_CHARS),
        Section::NiceToHave => (
            &mut sections.nice_to_have,
            MAX_NICE_TO_HAVE,
            MIN_NICE_TO_HAVE_CHARS,
        ),
    };
    let item = item.split_whitespace().collect::<Vec<_>>().join(" ");
    if list.len() < cap && item.chars().count() >= min_chars {
        list.push(item.chars().take(MAX_ITEM_CHARS).collect());
    }
}
