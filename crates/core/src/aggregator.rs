//! Corpus-level statistics over many role documents.

use crate::error::{InsightsError, Result};
use crate::extractor::Extractor;
use crate::lexicon::normalize;
use crate::models::{
    CommonSkill, CompanySize, ExperienceDistribution, ExtractionResult, MarketAnalysis,
    PhraseFrequency, RemotePolicy, RoleDocument, SalarySignal, SalaryStats, SkillCategory,
};
use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};

const SECTION_PHRASE_LIMIT: usize = 30;
const NICE_TO_HAVE_LIMIT: usize = 10;
const REMOTE_PRECEDENCE: [RemotePolicy; 3] =
    [RemotePolicy::Hybrid, RemotePolicy::Remote, RemotePolicy::Onsite];
const SIZE_PRECEDENCE: [CompanySize; 3] = [CompanySize::Mid, CompanySize::Small, CompanySize::Large];

/// Whether a skill seen in `frequency` of `valid` documents clears `threshold`.
/// No slack: a frequency below `threshold * valid` never counts.
pub fn meets_threshold(frequency: u32, threshold: f64, valid: usize) -> bool {
    frequency as f64 >= threshold * valid as f64
}

pub fn validate_threshold(threshold: f64) -> Result<()> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(InsightsError::Validation(format!(
            "threshold must be within [0, 1], got {threshold}"
        )))
    }
}

#[derive(Debug, Clone)]
pub struct Aggregator {
    extractor: Extractor,
    min_body_words: usize,
}

impl Aggregator {
    pub fn new(extractor: Extractor, min_body_words: usize) -> Self {
        Self {
            extractor,
            min_body_words,
        }
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    pub fn aggregate(
        &self,
        docs: &[RoleDocument],
        threshold: f64,
        min_documents: usize,
    ) -> Result<MarketAnalysis> {
        let valid = self.prepare(docs, threshold, min_documents)?;
        let extractions: Vec<ExtractionResult> =
            valid.iter().map(|doc| self.extractor.extract(doc)).collect();
        Ok(aggregate_extractions(
            &extractions,
            docs.len() - valid.len(),
            threshold,
        ))
    }

    /// Checks arguments and document shape, then returns the documents long
    /// enough to analyze. Fails when fewer than `min_documents` remain.
    pub fn prepare<'a>(
        &self,
        docs: &'a [RoleDocument],
        threshold: f64,
        min_documents: usize,
    ) -> Result<Vec<&'a RoleDocument>> {
        validate_threshold(threshold)?;
        for doc in docs {
            doc.validate()?;
        }
        let valid: Vec<&RoleDocument> = docs
            .iter()
            .filter(|doc| {
                let words = doc.word_count();
                let keep = words >= self.min_body_words;
                if !keep {
                    tracing::warn!(
                        "Excluding '{}' at {}: {} words, need {}",
                        doc.title,
                        doc.company,
                        words,
                        self.min_body_words
                    );
                }
                keep
            })
            .collect();
        if valid.len() < min_documents {
            return Err(InsightsError::InsufficientData {
                found: valid.len(),
                required: min_documents,
            });
        }
        Ok(valid)
    }
}

/// Folds per-document extractions into a [`MarketAnalysis`]. `excluded` is
/// reported as-is; every statistic is computed over `extractions` only.
pub fn aggregate_extractions<E: Borrow<ExtractionResult>>(
    extractions: &[E],
    excluded: usize,
    threshold: f64,
) -> MarketAnalysis {
    let n = extractions.len();
    let mut skill_frequency: BTreeMap<String, u32> = BTreeMap::new();
    let mut skill_meta: BTreeMap<String, (SkillCategory, f32)> = BTreeMap::new();
    let mut lows = Vec::new();
    let mut highs = Vec::new();
    let mut salary_unparsed = 0;
    let mut experience = ExperienceDistribution::default();
    let mut min_years = Vec::new();
    let mut remote_policy_counts = BTreeMap::new();
    let mut company_size_counts = BTreeMap::new();
    let mut company_stage_counts = BTreeMap::new();
    let mut degree_counts = BTreeMap::new();
    let mut with_degree = 0usize;
    let mut experience_level_counts = BTreeMap::new();
    let mut responsibilities = BTreeMap::new();
    let mut qualifications = BTreeMap::new();
    let mut nice_to_have = BTreeMap::new();

    for extraction in extractions {
        let extraction = extraction.borrow();
        for skill in &extraction.skills {
            *skill_frequency.entry(skill.name.clone()).or_insert(0) += 1;
            let meta = skill_meta
                .entry(skill.name.clone())
                .or_insert((skill.category, 0.0));
            meta.1 += skill.confidence;
        }
        match &extraction.salary {
            Some(SalarySignal::Parsed(range)) => {
                lows.push(range.low);
                highs.push(range.high);
            }
            Some(SalarySignal::Unparsed { .. }) => salary_unparsed += 1,
            None => {}
        }
        experience.record(&extraction.experience);
        if let Some(years) = extraction.experience.min_years() {
            min_years.push(years);
        }
        let company = &extraction.company;
        if let Some(policy) = company.remote_policy {
            *remote_policy_counts.entry(policy).or_insert(0) += 1;
        }
        if let Some(size) = company.size {
            *company_size_counts.entry(size).or_insert(0) += 1;
        }
        if let Some(stage) = company.stage {
            *company_stage_counts.entry(stage).or_insert(0) += 1;
        }
        for degree in &extraction.education {
            *degree_counts.entry(*degree).or_insert(0) += 1;
        }
        if !extraction.education.is_empty() {
            with_degree += 1;
        }
        if let Some(level) = extraction.experience_level {
            *experience_level_counts.entry(level).or_insert(0) += 1;
        }
        let sections = &extraction.sections;
        tally_phrases(&mut responsibilities, &sections.responsibilities);
        tally_phrases(&mut qualifications, &sections.qualifications);
        tally_phrases(&mut nice_to_have, &sections.nice_to_have);
    }

    let mut common_skills: Vec<CommonSkill> = skill_frequency
        .iter()
        .filter(|(_, freq)| meets_threshold(**freq, threshold, n))
        .filter_map(|(name, freq)| {
            let (category, confidence_sum) = skill_meta.get(name)?;
            Some(CommonSkill {
                name: name.clone(),
                category: *category,
                frequency: *freq,
                share: share(*freq as usize, n),
                mean_confidence: confidence_sum / *freq as f32,
            })
        })
        .collect();
    common_skills.sort_by(|a, b| b.frequency.cmp(&a.frequency).then_with(|| a.name.cmp(&b.name)));

    let mut category_breakdown = BTreeMap::new();
    for skill in &common_skills {
        *category_breakdown.entry(skill.category).or_insert(0) += 1;
    }

    let salary = salary_stats(&mut lows, &mut highs);
    let mean_min_years = if min_years.is_empty() {
        None
    } else {
        Some(min_years.iter().map(|y| *y as f64).sum::<f64>() / min_years.len() as f64)
    };

    tracing::info!(
        "Aggregated {} documents: {} distinct skills, {} common at threshold {}",
        n,
        skill_frequency.len(),
        common_skills.len(),
        threshold
    );

    MarketAnalysis {
        document_count: n,
        excluded_documents: excluded,
        threshold,
        skill_frequency,
        common_skills,
        category_breakdown,
        salary,
        salary_unparsed,
        experience,
        mean_min_years,
        experience_level_counts,
        common_responsibilities: top_phrases(responsibilities, SECTION_PHRASE_LIMIT),
        common_qualifications: top_phrases(qualifications, SECTION_PHRASE_LIMIT),
        common_nice_to_have: top_phrases(nice_to_have, NICE_TO_HAVE_LIMIT),
        remote_policy_majority: majority(&remote_policy_counts, &REMOTE_PRECEDENCE),
        remote_policy_counts,
        company_size_majority: majority(&company_size_counts, &SIZE_PRECEDENCE),
        company_size_counts,
        company_stage_counts,
        degree_counts,
        degree_requirement_share: share(with_degree, n),
    }
}

/// Counts each distinct normalized item once per document.
fn tally_phrases(table: &mut BTreeMap<String, u32>, items: &[String]) {
    let distinct: BTreeSet<String> = items
        .iter()
        .map(|item| normalize(item))
        .filter(|phrase| !phrase.is_empty())
        .collect();
    for phrase in distinct {
        *table.entry(phrase).or_insert(0) += 1;
    }
}

fn top_phrases(table: BTreeMap<String, u32>, limit: usize) -> Vec<PhraseFrequency> {
    let mut phrases: Vec<PhraseFrequency> = table
        .into_iter()
        .map(|(phrase, frequency)| PhraseFrequency { phrase, frequency })
        .collect();
    // stable sort keeps the BTreeMap's phrase order among equal frequencies
    phrases.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    phrases.truncate(limit);
    phrases
}

fn share(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// Median rounding half-up on even counts. Sorts `values` in place.
pub fn median(values: &mut [u64]) -> Option<u64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        let (a, b) = (values[mid - 1], values[mid]);
        Some(a / 2 + b / 2 + (a % 2 + b % 2 + 1) / 2)
    }
}

fn salary_stats(lows: &mut [u64], highs: &mut [u64]) -> Option<SalaryStats> {
    let median_low = median(lows)?;
    let median_high = median(highs)?;
    Some(SalaryStats {
        sample_size: lows.len() as u32,
        min: *lows.first()?,
        max: *highs.last()?,
        median_low,
        median_high,
    })
}

/// Most frequent key; ties go to whichever appears first in `precedence`.
fn majority<K: Ord + Copy>(counts: &BTreeMap<K, u32>, precedence: &[K]) -> Option<K> {
    let top = counts.values().copied().max()?;
    precedence
        .iter()
        .copied()
        .find(|key| counts.get(key) == Some(&top))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::ExtractorOptions;
    use crate::lexicon::Lexicon;
    use crate::models::{
        CompanySignal, DocumentSections, ExperienceBucket, ExperienceSignal, ExtractedSkill,
        PayPeriod, SalaryRange,
    };
    use crate::spans::RuleBasedSpans;
    use std::sync::Arc;

    fn aggregator(min_body_words: usize) -> Aggregator {
        let extractor = Extractor::new(
            Arc::new(Lexicon::default()),
            Arc::new(RuleBasedSpans),
            ExtractorOptions::default(),
        )
        .unwrap();
        Aggregator::new(extractor, min_body_words)
    }

    fn extraction() -> ExtractionResult {
        ExtractionResult::empty()
    }

    fn skill(name: &str, category: SkillCategory) -> ExtractedSkill {
        ExtractedSkill {
            name: name.into(),
            category,
            confidence: 1.0,
        }
    }

    fn salary(low: u64, high: u64) -> Option<SalarySignal> {
        Some(SalarySignal::Parsed(SalaryRange {
            currency: "USD".into(),
            low,
            high,
            period: PayPeriod::Annual,
        }))
    }

    #[test]
    fn median_rounds_half_up() {
        assert_eq!(median(&mut []), None);
        assert_eq!(median(&mut [5]), Some(5));
        assert_eq!(median(&mut [150_000, 130_000]), Some(140_000));
        assert_eq!(median(&mut [1, 2]), Some(2));
        assert_eq!(median(&mut [3, 1, 2]), Some(2));
        assert_eq!(median(&mut [u64::MAX, u64::MAX]), Some(u64::MAX));
    }

    #[test]
    fn threshold_comparison_is_inclusive_without_slack() {
        assert!(meets_threshold(3, 0.3, 10));
        assert!(meets_threshold(1, 0.1, 10));
        assert!(!meets_threshold(2, 0.3, 10));
        assert!(meets_threshold(0, 0.0, 4));
        assert!(!meets_threshold(3, 1.0, 4));
        assert!(meets_threshold(1, 0.5, 2));
        assert!(!meets_threshold(1, 0.5000000001, 2));
    }

    #[test]
    fn skill_just_below_threshold_is_not_common() {
        let mut a = extraction();
        a.skills = vec![skill("SQL", SkillCategory::Technical)];
        let analysis = aggregate_extractions(&[a.clone(), extraction()], 0, 0.5000000001);
        assert_eq!(analysis.skill_frequency["SQL"], 1);
        assert!(analysis.common_skills.is_empty());

        let analysis = aggregate_extractions(&[a, extraction()], 0, 0.5);
        assert_eq!(analysis.common_skill_names(), vec!["SQL"]);
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let agg = aggregator(0);
        let docs = vec![RoleDocument::new("PM", "Acme", "SQL")];
        assert!(matches!(
            agg.aggregate(&docs, 1.2, 1),
            Err(InsightsError::Validation(_))
        ));
        assert!(agg.aggregate(&docs, f64::NAN, 1).is_err());
    }

    #[test]
    fn short_documents_are_excluded_before_the_floor_check() {
        let agg = aggregator(5);
        let docs = vec![
            RoleDocument::new("PM", "A", "one two three four five"),
            RoleDocument::new("PM", "B", "too short"),
        ];
        let err = agg.aggregate(&docs, 0.3, 2).unwrap_err();
        assert_eq!(err.documents_found(), Some(1));
        let analysis = agg.aggregate(&docs, 0.3, 1).unwrap();
        assert_eq!(analysis.document_count, 1);
        assert_eq!(analysis.excluded_documents, 1);
    }

    #[test]
    fn blank_fields_fail_validation() {
        let agg = aggregator(0);
        let docs = vec![RoleDocument::new("", "Acme", "SQL")];
        assert!(matches!(
            agg.aggregate(&docs, 0.3, 1),
            Err(InsightsError::Validation(_))
        ));
    }

    #[test]
    fn common_skills_and_category_breakdown() {
        let mut a = extraction();
        a.skills = vec![
            skill("Python", SkillCategory::Technical),
            skill("SQL", SkillCategory::Technical),
        ];
        let mut b = extraction();
        b.skills = vec![
            skill("Roadmap", SkillCategory::Product),
            skill("SQL", SkillCategory::Technical),
        ];
        let mut c = extraction();
        c.skills = vec![skill("Roadmap", SkillCategory::Product)];

        let analysis = aggregate_extractions(&[a, b, c], 0, 0.5);
        assert_eq!(analysis.skill_frequency["Python"], 1);
        assert_eq!(analysis.common_skill_names(), vec!["Roadmap", "SQL"]);
        assert_eq!(analysis.category_breakdown[&SkillCategory::Technical], 1);
        assert_eq!(analysis.category_breakdown[&SkillCategory::Product], 1);
        assert!((analysis.common_skills[0].share - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn salary_statistics_use_parsed_ranges_only() {
        let mut a = extraction();
        a.salary = salary(150_000, 180_000);
        let mut b = extraction();
        b.salary = salary(130_000, 160_000);
        let mut c = extraction();
        c.salary = Some(SalarySignal::Unparsed {
            raw: "Competitive".into(),
        });
        let analysis = aggregate_extractions(&[a, b, c, extraction()], 0, 0.3);
        let stats = analysis.salary.unwrap();
        assert_eq!(stats.sample_size, 2);
        assert_eq!((stats.median_low, stats.median_high), (140_000, 170_000));
        assert_eq!((stats.min, stats.max), (130_000, 180_000));
        assert_eq!(analysis.salary_unparsed, 1);

        let none = aggregate_extractions(&[extraction(), extraction()], 0, 0.3);
        assert!(none.salary.is_none());
    }

    #[test]
    fn experience_buckets_and_unspecified() {
        let years = |min_years| ExperienceSignal::Range {
            min_years,
            max_years: None,
        };
        let signals = [years(1), years(4), years(7), years(12), ExperienceSignal::Unknown];
        let extractions: Vec<ExtractionResult> = signals
            .iter()
            .map(|s| ExtractionResult {
                experience: *s,
                ..extraction()
            })
            .collect();
        let analysis = aggregate_extractions(&extractions, 0, 0.3);
        let dist = analysis.experience;
        assert_eq!(
            (dist.entry, dist.mid, dist.senior, dist.lead, dist.unspecified),
            (1, 1, 1, 1, 1)
        );
        assert_eq!(analysis.mean_min_years, Some(6.0));
    }

    #[test]
    fn section_items_and_levels_are_tallied_per_document() {
        let listed = |responsibilities: &[&str], nice: &[&str], level| ExtractionResult {
            experience_level: level,
            sections: DocumentSections {
                responsibilities: responsibilities.iter().map(|r| r.to_string()).collect(),
                qualifications: Vec::new(),
                nice_to_have: nice.iter().map(|n| n.to_string()).collect(),
            },
            ..extraction()
        };
        let extractions = vec![
            listed(
                &["Own the roadmap.", "own the ROADMAP", "Write specs for engineering"],
                &["Fintech background"],
                Some(ExperienceBucket::Senior),
            ),
            listed(&["Own the roadmap"], &[], Some(ExperienceBucket::Senior)),
            listed(&["Write specs for engineering"], &[], Some(ExperienceBucket::Mid)),
            listed(&[], &[], None),
        ];
        let analysis = aggregate_extractions(&extractions, 0, 0.3);
        let phrases: Vec<(&str, u32)> = analysis
            .common_responsibilities
            .iter()
            .map(|p| (p.phrase.as_str(), p.frequency))
            .collect();
        assert_eq!(
            phrases,
            vec![("own the roadmap", 2), ("write specs for engineering", 2)]
        );
        assert!(analysis.common_qualifications.is_empty());
        assert_eq!(analysis.common_nice_to_have[0].phrase, "fintech background");
        assert_eq!(analysis.experience_level_counts[&ExperienceBucket::Senior], 2);
        assert_eq!(analysis.experience_level_counts[&ExperienceBucket::Mid], 1);
        assert!(!analysis.experience_level_counts.contains_key(&ExperienceBucket::Lead));
    }

    #[test]
    fn phrase_tables_are_capped() {
        let extractions: Vec<ExtractionResult> = (0..40)
            .map(|i| ExtractionResult {
                sections: DocumentSections {
                    responsibilities: vec![format!("Distinct duty number {i}")],
                    ..DocumentSections::default()
                },
                ..extraction()
            })
            .collect();
        let analysis = aggregate_extractions(&extractions, 0, 0.3);
        assert_eq!(analysis.common_responsibilities.len(), SECTION_PHRASE_LIMIT);
    }

    #[test]
    fn majority_ties_follow_precedence() {
        let with = |remote_policy, size| ExtractionResult {
            company: CompanySignal {
                size,
                stage: None,
                remote_policy,
            },
            ..extraction()
        };
        let extractions = vec![
            with(Some(RemotePolicy::Remote), Some(CompanySize::Small)),
            with(Some(RemotePolicy::Hybrid), Some(CompanySize::Large)),
            with(Some(RemotePolicy::Onsite), None),
            with(None, None),
        ];
        let analysis = aggregate_extractions(&extractions, 0, 0.3);
        assert_eq!(analysis.remote_policy_majority, Some(RemotePolicy::Hybrid));
        assert_eq!(analysis.company_size_majority, Some(CompanySize::Small));

        let extractions = vec![
            with(Some(RemotePolicy::Onsite), None),
            with(Some(RemotePolicy::Onsite), None),
            with(Some(RemotePolicy::Remote), None),
        ];
        let analysis = aggregate_extractions(&extractions, 0, 0.3);
        assert_eq!(analysis.remote_policy_majority, Some(RemotePolicy::Onsite));
        assert_eq!(analysis.company_size_majority, None);
    }

    #[test]
    fn empty_corpus_with_zero_floor() {
        let analysis = aggregator(0).aggregate(&[], 0.3, 0).unwrap();
        assert_eq!(analysis.document_count, 0);
        assert!(analysis.common_skills.is_empty());
        assert!(analysis.salary.is_none());
        assert_eq!(analysis.degree_requirement_share, 0.0);
    }
}
