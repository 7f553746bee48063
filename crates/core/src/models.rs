use crate::error::{InsightsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One externally sourced role description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleDocument {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(alias = "description")]
    pub body: String,
}

impl RoleDocument {
    pub fn new(title: &str, company: &str, body: &str) -> Self {
        Self {
            title: title.to_string(),
            company: company.to_string(),
            location: None,
            salary_range: None,
            body: body.to_string(),
        }
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    pub fn with_salary_range(mut self, salary_range: &str) -> Self {
        self.salary_range = Some(salary_range.to_string());
        self
    }

    pub fn word_count(&self) -> usize {
        self.body.split_whitespace().count()
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("title", &self.title),
            ("company", &self.company),
            ("body", &self.body),
        ] {
            if value.trim().is_empty() {
                return Err(InsightsError::Validation(format!(
                    "role document is missing required field '{field}'"
                )));
            }
        }
        Ok(())
    }
}

/// Parses a JSON array of role documents; shape errors surface as validation errors.
pub fn parse_documents(json: &str) -> Result<Vec<RoleDocument>> {
    let docs: Vec<RoleDocument> = serde_json::from_str(json)
        .map_err(|e| InsightsError::Validation(format!("malformed role documents: {e}")))?;
    for (idx, doc) in docs.iter().enumerate() {
        doc.validate()
            .map_err(|e| InsightsError::Validation(format!("document {idx}: {e}")))?;
    }
    Ok(docs)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    Technical,
    Product,
    Business,
    Leadership,
    Design,
    Data,
    Communication,
    Domain,
}

impl SkillCategory {
    pub const ALL: [SkillCategory; 8] = [
        SkillCategory::Technical,
        SkillCategory::Product,
        SkillCategory::Business,
        SkillCategory::Leadership,
        SkillCategory::Design,
        SkillCategory::Data,
        SkillCategory::Communication,
        SkillCategory::Domain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillCategory::Technical => "technical",
            SkillCategory::Product => "product",
            SkillCategory::Business => "business",
            SkillCategory::Leadership => "leadership",
            SkillCategory::Design => "design",
            SkillCategory::Data => "data",
            SkillCategory::Communication => "communication",
            SkillCategory::Domain => "domain",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSkill {
    pub name: String,
    pub category: SkillCategory,
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExperienceSignal {
    /// `max_years` is `None` for open-ended requirements such as "5+ years".
    Range { min_years: u32, max_years: Option<u32> },
    #[default]
    Unknown,
}

impl ExperienceSignal {
    pub fn min_years(&self) -> Option<u32> {
        match self {
            ExperienceSignal::Range { min_years, .. } => Some(*min_years),
            ExperienceSignal::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayPeriod {
    Hourly,
    Monthly,
    Annual,
}

/// Parsed salary band; `low` and `high` are always annualized whole dollars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub currency: String,
    pub low: u64,
    pub high: u64,
    /// Period the source string was quoted in.
    pub period: PayPeriod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SalarySignal {
    Parsed(SalaryRange),
    Unparsed { raw: String },
}

impl SalarySignal {
    pub fn parsed(&self) -> Option<&SalaryRange> {
        match self {
            SalarySignal::Parsed(range) => Some(range),
            SalarySignal::Unparsed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemotePolicy {
    Remote,
    Hybrid,
    Onsite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanySize {
    Small,
    Mid,
    Large,
}

impl CompanySize {
    pub fn from_headcount(headcount: u64) -> Self {
        match headcount {
            0..=199 => CompanySize::Small,
            200..=999 => CompanySize::Mid,
            _ => CompanySize::Large,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyStage {
    Startup,
    SeriesA,
    SeriesB,
    SeriesC,
    SeriesD,
    LateStage,
    Public,
    Enterprise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompanySignal {
    pub size: Option<CompanySize>,
    pub stage: Option<CompanyStage>,
    pub remote_policy: Option<RemotePolicy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Degree {
    Bachelor,
    Master,
    Mba,
    Doctorate,
}

/// Bulleted items found under recognized section headings, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSections {
    pub responsibilities: Vec<String>,
    pub qualifications: Vec<String>,
    pub nice_to_have: Vec<String>,
}

impl DocumentSections {
    pub fn is_empty(&self) -> bool {
        self.responsibilities.is_empty()
            && self.qualifications.is_empty()
            && self.nice_to_have.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Sorted by canonical name.
    pub skills: Vec<ExtractedSkill>,
    pub experience: ExperienceSignal,
    /// Seniority named in the title or body, else the bucket of `experience`.
    pub experience_level: Option<ExperienceBucket>,
    pub salary: Option<SalarySignal>,
    pub company: CompanySignal,
    pub education: Vec<Degree>,
    pub sections: DocumentSections,
}

impl ExtractionResult {
    pub fn empty() -> Self {
        Self {
            skills: Vec::new(),
            experience: ExperienceSignal::Unknown,
            experience_level: None,
            salary: None,
            company: CompanySignal::default(),
            education: Vec::new(),
            sections: DocumentSections::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceBucket {
    Entry,
    Mid,
    Senior,
    Lead,
}

impl ExperienceBucket {
    pub fn from_min_years(years: u32) -> Self {
        match years {
            0..=2 => ExperienceBucket::Entry,
            3..=5 => ExperienceBucket::Mid,
            6..=9 => ExperienceBucket::Senior,
            _ => ExperienceBucket::Lead,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceDistribution {
    pub entry: u32,
    pub mid: u32,
    pub senior: u32,
    pub lead: u32,
    pub unspecified: u32,
}

impl ExperienceDistribution {
    pub fn record(&mut self, signal: &ExperienceSignal) {
        match signal.min_years().map(ExperienceBucket::from_min_years) {
            Some(ExperienceBucket::Entry) => self.entry += 1,
            Some(ExperienceBucket::Mid) => self.mid += 1,
            Some(ExperienceBucket::Senior) => self.senior += 1,
            Some(ExperienceBucket::Lead) => self.lead += 1,
            None => self.unspecified += 1,
        }
    }

    pub fn count(&self, bucket: ExperienceBucket) -> u32 {
        match bucket {
            ExperienceBucket::Entry => self.entry,
            ExperienceBucket::Mid => self.mid,
            ExperienceBucket::Senior => self.senior,
            ExperienceBucket::Lead => self.lead,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryStats {
    pub sample_size: u32,
    pub min: u64,
    pub max: u64,
    pub median_low: u64,
    pub median_high: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonSkill {
    pub name: String,
    pub category: SkillCategory,
    pub frequency: u32,
    /// frequency / document_count
    pub share: f64,
    pub mean_confidence: f32,
}

/// A normalized section item and the number of valid documents listing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseFrequency {
    pub phrase: String,
    pub frequency: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAnalysis {
    /// Valid documents (body word count at or above the floor).
    pub document_count: usize,
    pub excluded_documents: usize,
    pub threshold: f64,
    /// Canonical skill name -> number of valid documents mentioning it.
    pub skill_frequency: BTreeMap<String, u32>,
    /// Sorted by frequency descending, then name.
    pub common_skills: Vec<CommonSkill>,
    pub category_breakdown: BTreeMap<SkillCategory, u32>,
    pub salary: Option<SalaryStats>,
    pub salary_unparsed: u32,
    pub experience: ExperienceDistribution,
    pub mean_min_years: Option<f64>,
    pub experience_level_counts: BTreeMap<ExperienceBucket, u32>,
    /// Most frequent section items, by frequency descending then phrase.
    pub common_responsibilities: Vec<PhraseFrequency>,
    pub common_qualifications: Vec<PhraseFrequency>,
    pub common_nice_to_have: Vec<PhraseFrequency>,
    pub remote_policy_counts: BTreeMap<RemotePolicy, u32>,
    pub remote_policy_majority: Option<RemotePolicy>,
    pub company_size_counts: BTreeMap<CompanySize, u32>,
    pub company_size_majority: Option<CompanySize>,
    pub company_stage_counts: BTreeMap<CompanyStage, u32>,
    pub degree_counts: BTreeMap<Degree, u32>,
    /// Share of valid documents naming at least one degree.
    pub degree_requirement_share: f64,
}

impl MarketAnalysis {
    pub fn is_common(&self, skill: &str) -> bool {
        self.common_skills.iter().any(|s| s.name == skill)
    }

    pub fn common_skill_names(&self) -> Vec<&str> {
        self.common_skills.iter().map(|s| s.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_blank_fields() {
        let doc = RoleDocument::new("PM", "  ", "body text");
        let err = doc.validate().unwrap_err();
        assert!(err.to_string().contains("company"));
        assert!(RoleDocument::new("PM", "Acme", "body").validate().is_ok());
    }

    #[test]
    fn parse_documents_maps_shape_errors_to_validation() {
        let missing_body = r#"[{"title": "PM", "company": "Acme"}]"#;
        assert!(matches!(
            parse_documents(missing_body),
            Err(InsightsError::Validation(_))
        ));

        let ok = r#"[{"title": "PM", "company": "Acme", "description": "we build", "salary_range": "$100k"}]"#;
        let docs = parse_documents(ok).unwrap();
        assert_eq!(docs[0].body, "we build");
        assert_eq!(docs[0].salary_range.as_deref(), Some("$100k"));
        assert_eq!(docs[0].location, None);
    }

    #[test]
    fn experience_buckets_use_fixed_bands() {
        assert_eq!(ExperienceBucket::from_min_years(0), ExperienceBucket::Entry);
        assert_eq!(ExperienceBucket::from_min_years(2), ExperienceBucket::Entry);
        assert_eq!(ExperienceBucket::from_min_years(3), ExperienceBucket::Mid);
        assert_eq!(ExperienceBucket::from_min_years(5), ExperienceBucket::Mid);
        assert_eq!(ExperienceBucket::from_min_years(6), ExperienceBucket::Senior);
        assert_eq!(ExperienceBucket::from_min_years(9), ExperienceBucket::Senior);
        assert_eq!(ExperienceBucket::from_min_years(10), ExperienceBucket::Lead);
    }

    #[test]
    fn distribution_counts_unknown_as_unspecified() {
        let mut dist = ExperienceDistribution::default();
        dist.record(&ExperienceSignal::Unknown);
        dist.record(&ExperienceSignal::Range {
            min_years: 4,
            max_years: Some(6),
        });
        assert_eq!(dist.unspecified, 1);
        assert_eq!(dist.count(ExperienceBucket::Mid), 1);
        assert_eq!(dist.count(ExperienceBucket::Entry), 0);
    }

    #[test]
    fn headcount_buckets() {
        assert_eq!(CompanySize::from_headcount(50), CompanySize::Small);
        assert_eq!(CompanySize::from_headcount(200), CompanySize::Mid);
        assert_eq!(CompanySize::from_headcount(1000), CompanySize::Large);
    }

    #[test]
    fn category_parse_round_trips_names() {
        for c in SkillCategory::ALL {
            assert_eq!(SkillCategory::parse(c.as_str()), Some(c));
        }
        assert_eq!(SkillCategory::parse("Technical "), Some(SkillCategory::Technical));
        assert_eq!(SkillCategory::parse("marketing"), None);
    }
}
