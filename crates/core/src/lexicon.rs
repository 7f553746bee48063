//! Skill vocabulary: canonical skills, their categories, alias phrasings, and
//! the text normalization plus boundary matching every matcher shares.

use crate::error::{InsightsError, Result};
use crate::models::SkillCategory;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use SkillCategory::*;

const DEFAULT_SKILLS: &[(&str, SkillCategory, &[&str])] = &[
    // technical
    ("SQL", Technical, &["advanced sql", "sql database", "sql databases", "sql queries"]),
    ("Python", Technical, &[]),
    ("Java", Technical, &[]),
    ("JavaScript", Technical, &["js"]),
    ("TypeScript", Technical, &[]),
    ("APIs", Technical, &["api", "api design", "rest api", "rest apis"]),
    ("GraphQL", Technical, &[]),
    ("AWS", Technical, &["amazon web services"]),
    ("Azure", Technical, &[]),
    ("GCP", Technical, &["google cloud", "google cloud platform"]),
    ("Cloud", Technical, &["cloud computing", "cloud platforms"]),
    ("Kubernetes", Technical, &["k8s"]),
    ("Docker", Technical, &[]),
    ("Microservices", Technical, &["microservice architecture"]),
    ("System Design", Technical, &["systems design", "architecture"]),
    ("Technical Specifications", Technical, &["technical specs", "tech specs"]),
    ("NoSQL", Technical, &[]),
    ("Data Structures", Technical, &[]),
    ("Algorithms", Technical, &[]),
    ("CI/CD", Technical, &["continuous integration", "continuous delivery"]),
    // product
    ("Product Strategy", Product, &[]),
    ("Product Vision", Product, &[]),
    ("Roadmap", Product, &["roadmapping", "product roadmap", "roadmaps"]),
    ("Product Lifecycle", Product, &["product life cycle"]),
    ("Product Development", Product, &[]),
    ("Prioritization", Product, &["feature prioritization", "prioritisation"]),
    ("Backlog Management", Product, &["backlog grooming", "backlog"]),
    ("User Stories", Product, &[]),
    ("Product Metrics", Product, &["product analytics"]),
    ("Agile", Product, &["agile methodologies", "agile methodology"]),
    ("Scrum", Product, &[]),
    ("Kanban", Product, &[]),
    ("Jira", Product, &[]),
    ("Sprint Planning", Product, &["sprints", "sprint"]),
    // business
    ("Business Strategy", Business, &[]),
    ("Market Analysis", Business, &[]),
    ("Competitive Analysis", Business, &["competitor analysis", "competitive research"]),
    ("Go-to-Market", Business, &["gtm", "go to market", "go-to-market strategy"]),
    ("Pricing", Business, &["pricing strategy"]),
    ("Monetization", Business, &["monetisation"]),
    ("P&L", Business, &["p&l ownership", "profit and loss"]),
    ("ROI", Business, &["return on investment"]),
    ("Business Case", Business, &["business cases"]),
    ("Financial Modeling", Business, &["financial modelling"]),
    ("Market Research", Business, &[]),
    ("Customer Segmentation", Business, &[]),
    // leadership
    ("Stakeholder Management", Leadership, &["managing stakeholders", "stakeholder alignment"]),
    ("Cross-Functional Collaboration", Leadership, &["cross-functional", "cross functional"]),
    ("Leadership", Leadership, &["leading teams", "people leadership"]),
    ("Team Management", Leadership, &["people management", "managing teams"]),
    ("Mentoring", Leadership, &["mentorship", "mentor"]),
    ("Coaching", Leadership, &[]),
    ("Influence", Leadership, &["influence without authority"]),
    // design
    ("UX", Design, &["user experience", "ux design"]),
    ("UI", Design, &["user interface", "ui design"]),
    ("Wireframing", Design, &["wireframes"]),
    ("Prototyping", Design, &["prototypes"]),
    ("Figma", Design, &[]),
    ("User Research", Design, &["customer research"]),
    ("Usability Testing", Design, &[]),
    ("Design Thinking", Design, &[]),
    // data
    ("Data Analysis", Data, &["data analytics", "analyzing data"]),
    ("Analytics", Data, &[]),
    ("A/B Testing", Data, &["ab testing", "a/b tests", "split testing"]),
    ("Experimentation", Data, &["experiments"]),
    ("KPIs", Data, &["kpi", "key performance indicators"]),
    ("Metrics", Data, &[]),
    ("Tableau", Data, &[]),
    ("Google Analytics", Data, &[]),
    ("Mixpanel", Data, &[]),
    ("Amplitude", Data, &[]),
    ("Excel", Data, &["spreadsheets"]),
    ("Statistics", Data, &["statistical analysis"]),
    ("Data-Driven", Data, &["data driven"]),
    ("Cohort Analysis", Data, &[]),
    ("Funnel Analysis", Data, &[]),
    // communication
    ("Communication", Communication, &["communication skills", "written communication", "verbal communication"]),
    ("Presentation", Communication, &["presentation skills", "presenting"]),
    ("Executive Communication", Communication, &["executive presence"]),
    ("Storytelling", Communication, &[]),
    ("Negotiation", Communication, &[]),
    ("Documentation", Communication, &["technical writing"]),
    // domain
    ("SaaS", Domain, &["software as a service"]),
    ("B2B", Domain, &[]),
    ("B2C", Domain, &[]),
    ("Mobile", Domain, &["mobile apps", "ios", "android"]),
    ("Marketplace", Domain, &["marketplaces"]),
    ("E-commerce", Domain, &["ecommerce"]),
    ("Fintech", Domain, &["financial services"]),
    ("Healthtech", Domain, &["healthcare"]),
    ("Edtech", Domain, &[]),
    ("Platform", Domain, &["platforms"]),
];

/// A canonical skill and the alias phrasings that resolve to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillEntry {
    pub name: String,
    pub category: SkillCategory,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// A normalized phrase that resolves to one lexicon entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceForm {
    pub term: String,
    pub entry: usize,
}

/// Immutable skill vocabulary. Build once and share via `Arc`.
#[derive(Debug, Clone)]
pub struct Lexicon {
    entries: Vec<SkillEntry>,
    forms: Vec<SurfaceForm>,
    by_term: HashMap<String, usize>,
}

#[derive(Debug, Deserialize)]
struct LexiconFile {
    skills: Vec<SkillEntry>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Lexicon {
    pub fn builder() -> LexiconBuilder {
        LexiconBuilder::default()
    }

    /// The built-in product and technology vocabulary.
    pub fn builtin() -> Self {
        let entries = DEFAULT_SKILLS
            .iter()
            .map(|(name, category, aliases)| SkillEntry {
                name: name.to_string(),
                category: *category,
                aliases: aliases.iter().map(|a| a.to_string()).collect(),
            })
            .collect();
        Self::index(entries)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: LexiconFile =
            toml::from_str(content).map_err(|e| InsightsError::Lexicon(e.to_string()))?;
        let mut builder = Self::builder();
        for entry in file.skills {
            builder = builder.entry(entry);
        }
        builder.build()
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading lexicon {}", path.display()))?;
        let lexicon = Self::from_toml_str(&content)
            .with_context(|| format!("parsing lexicon {}", path.display()))?;
        tracing::info!(
            "Loaded lexicon from {} ({} skills)",
            path.display(),
            lexicon.len()
        );
        Ok(lexicon)
    }

    fn index(mut entries: Vec<SkillEntry>) -> Self {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        let mut forms = Vec::new();
        let mut by_term = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            let phrases = std::iter::once(&entry.name).chain(entry.aliases.iter());
            for phrase in phrases {
                let term = normalize(phrase);
                if term.is_empty() || by_term.contains_key(&term) {
                    continue;
                }
                by_term.insert(term.clone(), idx);
                forms.push(SurfaceForm { term, entry: idx });
            }
        }
        Self {
            entries,
            forms,
            by_term,
        }
    }

    pub fn entries(&self) -> &[SkillEntry] {
        &self.entries
    }

    pub fn entry(&self, idx: usize) -> &SkillEntry {
        &self.entries[idx]
    }

    pub fn surface_forms(&self) -> &[SurfaceForm] {
        &self.forms
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves a free phrase ("Advanced SQL") to its canonical entry.
    pub fn canonicalize(&self, phrase: &str) -> Option<&SkillEntry> {
        self.by_term
            .get(&normalize(phrase))
            .map(|idx| &self.entries[*idx])
    }

    pub fn category_of(&self, name: &str) -> Option<SkillCategory> {
        self.canonicalize(name).map(|e| e.category)
    }
}

#[derive(Debug, Default)]
pub struct LexiconBuilder {
    entries: Vec<SkillEntry>,
}

impl LexiconBuilder {
    pub fn skill(self, name: &str, category: SkillCategory, aliases: &[&str]) -> Self {
        self.entry(SkillEntry {
            name: name.to_string(),
            category,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        })
    }

    pub fn entry(mut self, entry: SkillEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Rejects blank names and any phrase claimed by two different skills.
    pub fn build(self) -> Result<Lexicon> {
        let mut owners: HashMap<String, usize> = HashMap::new();
        for (idx, entry) in self.entries.iter().enumerate() {
            let name = normalize(&entry.name);
            if name.is_empty() {
                return Err(InsightsError::Lexicon(format!(
                    "skill name '{}' is empty after normalization",
                    entry.name
                )));
            }
            if let Some(prev) = owners.get(&name) {
                if *prev != idx && normalize(&self.entries[*prev].name) == name {
                    return Err(InsightsError::Lexicon(format!(
                        "skill '{}' is defined twice",
                        entry.name
                    )));
                }
            }
            let phrases = std::iter::once(&entry.name).chain(entry.aliases.iter());
            for phrase in phrases {
                let term = normalize(phrase);
                if term.is_empty() {
                    continue;
                }
                match owners.get(&term) {
                    Some(owner) if *owner != idx => {
                        return Err(InsightsError::Lexicon(format!(
                            "'{}' maps to both '{}' and '{}'",
                            phrase, self.entries[*owner].name, entry.name
                        )));
                    }
                    _ => {
                        owners.insert(term, idx);
                    }
                }
            }
        }
        Ok(Lexicon::index(self.entries))
    }
}

fn is_dash(c: char) -> bool {
    matches!(c, '-' | '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}')
}

/// Lowercases, strips punctuation, and collapses whitespace.
///
/// Intra-token joiners survive so multi-symbol skills stay matchable:
/// `-`, `/`, `&`, `.` between two alphanumerics ("a/b", "p&l", "node.js"),
/// `+` and `#` directly after a token ("c++", "c#", "5+"). Apostrophes are
/// dropped, thousands separators between digits are removed, and a dash
/// between two numbers becomes a tight range ("3 – 5" -> "3-5").
pub fn normalize(text: &str) -> String {
    let chars: Vec<char> = text.chars().flat_map(char::to_lowercase).collect();
    let mut out = String::with_capacity(chars.len());
    let mut pending_space = false;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let prev = out.chars().next_back();
        let next = chars.get(i + 1).copied();
        let prev_tight = !pending_space && prev.is_some();
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else if matches!(c, '\'' | '\u{2019}' | '`') {
            // dropped without breaking the token
        } else if c == ','
            && prev_tight
            && prev.is_some_and(|p| p.is_ascii_digit())
            && next.is_some_and(|n| n.is_ascii_digit())
        {
            // thousands separator
        } else if is_dash(c)
            && prev.is_some_and(|p| p.is_ascii_digit())
            && chars[i + 1..]
                .iter()
                .find(|n| !n.is_whitespace())
                .is_some_and(|n| n.is_ascii_digit())
        {
            out.push('-');
            pending_space = false;
            while chars.get(i + 1).is_some_and(|n| n.is_whitespace()) {
                i += 1;
            }
        } else if (c == '-' || matches!(c, '/' | '&' | '.'))
            && prev_tight
            && prev.is_some_and(char::is_alphanumeric)
            && next.is_some_and(char::is_alphanumeric)
        {
            out.push(c);
        } else if matches!(c, '+' | '#')
            && prev_tight
            && prev.is_some_and(|p| p.is_alphanumeric() || p == '+')
        {
            out.push(c);
        } else {
            pending_space = true;
        }
        i += 1;
    }
    out
}

/// Joiners `normalize` keeps inside a token that still separate terms, so
/// "python/sql" holds both "python" and "sql".
const TERM_JOINERS: &[char] = &[' ', '-', '/', '&', '.'];

fn boundary_before(haystack: &str, start: usize) -> bool {
    haystack[..start]
        .chars()
        .next_back()
        .map_or(true, |c| TERM_JOINERS.contains(&c))
}

fn boundary_after(haystack: &str, end: usize) -> bool {
    haystack[end..]
        .chars()
        .next()
        .map_or(true, |c| TERM_JOINERS.contains(&c))
}

/// Counts whole-token occurrences of an already-normalized `term` in
/// normalized text. Hyphens, slashes, ampersands, and inner dots count as
/// token boundaries.
pub fn count_term(haystack: &str, term: &str) -> usize {
    if term.is_empty() {
        return 0;
    }
    haystack
        .match_indices(term)
        .filter(|(start, _)| {
            boundary_before(haystack, *start) && boundary_after(haystack, start + term.len())
        })
        .count()
}

pub fn contains_term(haystack: &str, term: &str) -> bool {
    count_term(haystack, term) > 0
}
