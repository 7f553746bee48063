use crate::error::Result;
use crate::lexicon::{count_term, normalize, Lexicon};
use crate::matchers::Matchers;
use crate::models::{ExtractedSkill, ExtractionResult, RoleDocument, SalarySignal};
use crate::sections::extract_sections;
use crate::spans::SpanExtractor;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractorOptions {
    /// Mentions of a single phrasing needed for confidence 1.0.
    pub mentions_to_saturate: u32,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            mentions_to_saturate: 3,
        }
    }
}

/// Turns one role document into structured signals. Pure: the same document
/// always yields the same result.
#[derive(Clone)]
pub struct Extractor {
    lexicon: Arc<Lexicon>,
    spans: Arc<dyn SpanExtractor>,
    matchers: Matchers,
    options: ExtractorOptions,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("skills", &self.lexicon.len())
            .field("spans", &self.spans.name())
            .field("options", &self.options)
            .finish()
    }
}

impl Extractor {
    pub fn new(
        lexicon: Arc<Lexicon>,
        spans: Arc<dyn SpanExtractor>,
        options: ExtractorOptions,
    ) -> Result<Self> {
        Ok(Self {
            lexicon,
            spans,
            matchers: Matchers::new()?,
            options: ExtractorOptions {
                mentions_to_saturate: options.mentions_to_saturate.max(1),
            },
        })
    }

    pub fn lexicon(&self) -> &Arc<Lexicon> {
        &self.lexicon
    }

    pub fn extract(&self, doc: &RoleDocument) -> ExtractionResult {
        let body = normalize(&doc.body);
        let company_text = match doc.location.as_deref() {
            Some(location) if !location.trim().is_empty() => {
                format!("{} {}", normalize(location), body)
            }
            _ => body.clone(),
        };
        let salary = match doc.salary_range.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(self.matchers.salary_field(raw)),
            _ => self.matchers.salary_in_body(&doc.body),
        };
        if let Some(SalarySignal::Unparsed { raw }) = &salary {
            tracing::warn!("Could not parse salary '{}' for '{}'", raw, doc.title);
        }
        let experience = self.matchers.experience(&body);
        let result = ExtractionResult {
            skills: self.skills(&doc.body),
            experience,
            experience_level: self.matchers.experience_level(
                &normalize(&doc.title),
                &body,
                &experience,
            ),
            salary,
            company: self.matchers.company(&company_text),
            education: self.matchers.education(&body),
            sections: extract_sections(&doc.body),
        };
        tracing::debug!(
            "Extracted {} skills from '{}' at {}",
            result.skills.len(),
            doc.title,
            doc.company
        );
        result
    }

    fn skills(&self, body: &str) -> Vec<ExtractedSkill> {
        let chunks: Vec<String> = self
            .spans
            .extract_candidate_spans(body)
            .iter()
            .map(|span| normalize(span.text(body)))
            .collect();
        let saturate = self.options.mentions_to_saturate;
        // entry index order is canonical name order
        let mut best: BTreeMap<usize, f32> = BTreeMap::new();
        for form in self.lexicon.surface_forms() {
            let mentions: usize = chunks.iter().map(|c| count_term(c, &form.term)).sum();
            if mentions == 0 {
                continue;
            }
            let capped = mentions.min(saturate as usize) as f32;
            let confidence = capped / saturate as f32;
            let slot = best.entry(form.entry).or_insert(0.0);
            if confidence > *slot {
                *slot = confidence;
            }
        }
        best.into_iter()
            .map(|(idx, confidence)| {
                let entry = self.lexicon.entry(idx);
                ExtractedSkill {
                    name: entry.name.clone(),
                    category: entry.category,
                    confidence,
                }
            })
            .collect()
    }
}
