//! Pattern matchers for the non-skill signals of a role document.
//!
//! Experience, company, and education matchers read normalized text (see
//! [`crate::lexicon::normalize`]); the salary matcher reads the raw salary
//! field or body since it needs `$`, decimals, and period markers intact.

use crate::error::Result;
use crate::lexicon::contains_term;
use crate::models::{
    CompanySignal, CompanySize, CompanyStage, Degree, ExperienceBucket, ExperienceSignal,
    PayPeriod, RemotePolicy, SalaryRange, SalarySignal,
};
use regex::{Captures, Regex};

const MAX_PLAUSIBLE_YEARS: u32 = 40;
/// Number groups of the experience pattern; `lo` pairs with `hi`.
const EXPERIENCE_GROUPS: &[&str] = &["lo", "min", "plus", "bare", "after"];
const HOURS_PER_YEAR: f64 = 2080.0;
const MONTHS_PER_YEAR: f64 = 12.0;

const NON_USD_SYMBOLS: &[char] = &['€', '£', '¥', '₹'];
const NON_USD_CODES: &[&str] = &["eur", "gbp", "cad", "aud", "inr", "chf", "jpy"];

const FULLY_REMOTE: &[&str] = &["fully remote", "remote-first", "remote first", "100 remote"];
const HYBRID: &[&str] = &["hybrid"];
const ONSITE: &[&str] = &["on-site", "onsite", "on site", "in-office", "in office"];
const STARTUP: &[&str] = &["startup", "start-up", "early-stage", "early stage", "seed"];
const LATE_STAGE: &[&str] = &["late-stage", "late stage", "pre-ipo"];
const PUBLIC: &[&str] = &["publicly traded", "public company", "nasdaq", "nyse"];
const ENTERPRISE: &[&str] = &["enterprise"];

/// Seniority words, most senior first. Titles are read for bare words; bodies
/// only for explicit level phrases since "lead" and "senior" are common verbs
/// and adjectives there.
const TITLE_LEVELS: &[(ExperienceBucket, &[&str])] = &[
    (
        ExperienceBucket::Lead,
        &["lead", "principal", "staff", "head of", "director"],
    ),
    (ExperienceBucket::Senior, &["senior", "sr"]),
    (
        ExperienceBucket::Entry,
        &["junior", "jr", "entry level", "entry-level", "associate", "intern"],
    ),
];
const BODY_LEVELS: &[(ExperienceBucket, &[&str])] = &[
    (
        ExperienceBucket::Lead,
        &["principal level", "principal-level", "staff level", "staff-level", "lead-level"],
    ),
    (
        ExperienceBucket::Senior,
        &["senior level", "senior-level", "senior role", "senior position"],
    ),
    (
        ExperienceBucket::Entry,
        &["entry level", "entry-level", "junior", "new grad", "new graduate", "recent graduate"],
    ),
];

const DEGREES: &[(Degree, &[&str])] = &[
    (Degree::Bachelor, &["bachelor", "bachelors", "undergraduate degree"]),
    (Degree::Master, &["masters", "master degree", "master of"]),
    (Degree::Mba, &["mba"]),
    (Degree::Doctorate, &["phd", "ph.d", "doctorate", "doctoral"]),
];

/// Compiled patterns, built once per extractor.
#[derive(Debug, Clone)]
pub struct Matchers {
    experience: Regex,
    salary_field: Regex,
    salary_body: Regex,
    headcount: Regex,
    series: Regex,
}

impl Matchers {
    pub fn new() -> Result<Self> {
        let amount = r"(\d[\d,]*(?:\.\d+)?)\s*([kK])?";
        let dash = r"\s*(?:-|–|—|to)\s*";
        Ok(Self {
            experience: Regex::new(
                r"(?x)
                \b(?P<lo>\d{1,3})(?:-|\ to\ )(?P<hi>\d{1,3})\+?\ (?:years?|yrs?)\b
                | (?:minimum(?:\ of)?|at\ least|min)\ (?P<min>\d{1,3})\+?\ (?:years?|yrs?)\b
                | \b(?P<plus>\d{1,3})\+\ (?:years?|yrs?)\b
                | \b(?P<bare>\d{1,3})\ (?:years?|yrs?)\ (?:of|experience|professional|relevant|hands-on|industry)\b
                | \bexperience\ (?:of\ )?(?P<after>\d{1,3})\ (?:years?|yrs?)\b
                ",
            )?,
            salary_field: Regex::new(&format!(
                r"\$\s*{amount}(?:{dash}\$?\s*{amount})?"
            ))?,
            salary_body: Regex::new(&format!(r"\$\s*{amount}{dash}\$\s*{amount}"))?,
            headcount: Regex::new(
                r"\b(?:\d{1,6}-)?(?P<n>\d{1,6})\+? (?:employees|people|staff|team members)\b",
            )?,
            series: Regex::new(r"\bseries (?P<round>[a-h])\b")?,
        })
    }

    /// Earliest plausible years-of-experience requirement in normalized text.
    /// A bare "N years" counts only next to requirement wording such as
    /// "of", "experience", or "relevant".
    pub fn experience(&self, text: &str) -> ExperienceSignal {
        for caps in self.experience.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let Some(first) = EXPERIENCE_GROUPS.iter().find_map(|name| caps.name(name)) else {
                continue;
            };
            if text[..first.start()].ends_with('.') {
                // fractional years such as "2.5 years"
                continue;
            }
            let candidate = if let (Some(lo), Some(hi)) = (number(&caps, "lo"), number(&caps, "hi")) {
                Some((lo, Some(hi)))
            } else {
                EXPERIENCE_GROUPS[1..]
                    .iter()
                    .find_map(|name| number(&caps, name))
                    .map(|n| (n, None))
            };
            let Some((min_years, max_years)) = candidate else { continue };
            let upper = max_years.unwrap_or(min_years);
            if min_years > upper || upper > MAX_PLAUSIBLE_YEARS {
                tracing::debug!("Discarding ambiguous experience mention '{}'", whole.as_str());
                continue;
            }
            return ExperienceSignal::Range {
                min_years,
                max_years,
            };
        }
        ExperienceSignal::Unknown
    }

    /// Parses a dedicated salary field. Anything that is not a USD amount or
    /// range comes back as `Unparsed` with the raw text preserved.
    pub fn salary_field(&self, raw: &str) -> SalarySignal {
        let unparsed = || SalarySignal::Unparsed {
            raw: raw.to_string(),
        };
        let lower = raw.to_lowercase();
        if raw.contains(NON_USD_SYMBOLS) || has_currency_code(&lower) || !raw.contains('$') {
            return unparsed();
        }
        let Some(caps) = self.salary_field.captures(raw) else {
            return unparsed();
        };
        let period = pay_period(&lower);
        salary_from_captures(&caps, period).map_or_else(unparsed, SalarySignal::Parsed)
    }

    /// Searches free text for an explicit `$X - $Y` range.
    pub fn salary_in_body(&self, body: &str) -> Option<SalarySignal> {
        let caps = self.salary_body.captures(body)?;
        let whole = caps.get(0)?;
        let tail: String = body[whole.end()..].chars().take(24).collect();
        let period = pay_period(&tail.to_lowercase());
        Some(
            salary_from_captures(&caps, period).map_or_else(
                || SalarySignal::Unparsed {
                    raw: whole.as_str().to_string(),
                },
                SalarySignal::Parsed,
            ),
        )
    }

    pub fn company(&self, text: &str) -> CompanySignal {
        CompanySignal {
            size: self.company_size(text),
            stage: self.company_stage(text),
            remote_policy: remote_policy(text),
        }
    }

    fn company_size(&self, text: &str) -> Option<CompanySize> {
        if contains_term(text, "fortune 500") {
            return Some(CompanySize::Large);
        }
        self.headcount
            .captures(text)
            .and_then(|caps| caps.name("n")?.as_str().parse::<u64>().ok())
            .map(CompanySize::from_headcount)
    }

    fn company_stage(&self, text: &str) -> Option<CompanyStage> {
        if let Some(round) = self
            .series
            .captures(text)
            .and_then(|caps| caps.name("round"))
        {
            return Some(match round.as_str() {
                "a" => CompanyStage::SeriesA,
                "b" => CompanyStage::SeriesB,
                "c" => CompanyStage::SeriesC,
                "d" => CompanyStage::SeriesD,
                _ => CompanyStage::LateStage,
            });
        }
        [
            (LATE_STAGE, CompanyStage::LateStage),
            (STARTUP, CompanyStage::Startup),
            (PUBLIC, CompanyStage::Public),
            (ENTERPRISE, CompanyStage::Enterprise),
        ]
        .into_iter()
        .find(|(terms, _)| any_term(text, terms))
        .map(|(_, stage)| stage)
    }

    /// Seniority from the normalized title, then the normalized body, then
    /// the bucket of the experience requirement. `None` when all are silent.
    pub fn experience_level(
        &self,
        title: &str,
        text: &str,
        experience: &ExperienceSignal,
    ) -> Option<ExperienceBucket> {
        level_named(title, TITLE_LEVELS)
            .or_else(|| level_named(text, BODY_LEVELS))
            .or_else(|| experience.min_years().map(ExperienceBucket::from_min_years))
    }

    /// Degrees named in normalized text, in ascending order.
    pub fn education(&self, text: &str) -> Vec<Degree> {
        DEGREES
            .iter()
            .filter(|(_, terms)| any_term(text, terms))
            .map(|(degree, _)| *degree)
            .collect()
    }
}

fn any_term(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| contains_term(text, t))
}

fn level_named(text: &str, levels: &[(ExperienceBucket, &[&str])]) -> Option<ExperienceBucket> {
    levels
        .iter()
        .find(|(_, terms)| any_term(text, terms))
        .map(|(level, _)| *level)
}

fn remote_policy(text: &str) -> Option<RemotePolicy> {
    if any_term(text, FULLY_REMOTE) {
        Some(RemotePolicy::Remote)
    } else if any_term(text, HYBRID) {
        Some(RemotePolicy::Hybrid)
    } else if any_term(text, ONSITE) {
        Some(RemotePolicy::Onsite)
    } else if contains_term(text, "remote") {
        Some(RemotePolicy::Remote)
    } else {
        None
    }
}

fn number(caps: &Captures, name: &str) -> Option<u32> {
    caps.name(name)?.as_str().parse().ok()
}

fn has_currency_code(lower: &str) -> bool {
    lower
        .split(|c: char| !c.is_ascii_alphabetic())
        .any(|word| NON_USD_CODES.contains(&word))
}

fn pay_period(lower: &str) -> PayPeriod {
    let compact: String = lower.chars().filter(|c| !c.is_whitespace()).collect();
    if ["/hr", "/hour", "perhour", "anhour", "hourly"]
        .iter()
        .any(|m| compact.contains(m))
    {
        PayPeriod::Hourly
    } else if ["/mo", "permonth", "monthly", "amonth"]
        .iter()
        .any(|m| compact.contains(m))
    {
        PayPeriod::Monthly
    } else {
        PayPeriod::Annual
    }
}

fn amount(caps: &Captures, value: usize, suffix: usize) -> Option<(f64, bool)> {
    let digits: String = caps
        .get(value)?
        .as_str()
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let parsed: f64 = digits.parse().ok()?;
    Some((parsed, caps.get(suffix).is_some()))
}

/// Builds an annualized range from amount captures (groups 1-2 low, 3-4 high).
fn salary_from_captures(caps: &Captures, period: PayPeriod) -> Option<SalaryRange> {
    let (mut low, low_k) = amount(caps, 1, 2)?;
    let (mut high, high_k) = amount(caps, 3, 4).unwrap_or((low, low_k));
    if low_k {
        low *= 1000.0;
    }
    if high_k {
        high *= 1000.0;
        if !low_k && low < 1000.0 {
            low *= 1000.0;
        }
    }
    let factor = match period {
        PayPeriod::Hourly => HOURS_PER_YEAR,
        PayPeriod::Monthly => MONTHS_PER_YEAR,
        PayPeriod::Annual => 1.0,
    };
    let low = (low * factor).round();
    let high = (high * factor).round();
    if low <= 0.0 || high <= 0.0 || low > high {
        return None;
    }
    Some(SalaryRange {
        currency: "USD".to_string(),
        low: low as u64,
        high: high as u64,
        period,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::normalize;

    fn matchers() -> Matchers {
        Matchers::new().unwrap()
    }

    fn experience(text: &str) -> ExperienceSignal {
        matchers().experience(&normalize(text))
    }

    fn range(min_years: u32, max_years: Option<u32>) -> ExperienceSignal {
        ExperienceSignal::Range {
            min_years,
            max_years,
        }
    }

    #[test]
    fn experience_patterns() {
        assert_eq!(experience("5+ years of product experience"), range(5, None));
        assert_eq!(experience("3-5 years in B2B SaaS"), range(3, Some(5)));
        assert_eq!(experience("3 – 5 yrs experience"), range(3, Some(5)));
        assert_eq!(experience("4 to 6 years"), range(4, Some(6)));
        assert_eq!(experience("Minimum of 7 years managing teams"), range(7, None));
        assert_eq!(experience("at least 2 years"), range(2, None));
        assert_eq!(experience("8 years of experience shipping products"), range(8, None));
        assert_eq!(experience("Experience: 6 years minimum"), range(6, None));
        assert_eq!(experience("4 years relevant work"), range(4, None));
    }

    #[test]
    fn bare_years_without_requirement_wording_are_unknown() {
        assert_eq!(
            experience("A family business serving Ohio for 20 years"),
            ExperienceSignal::Unknown
        );
        assert_eq!(experience("in business 20 years"), ExperienceSignal::Unknown);
        assert_eq!(experience("Our platform launched 8 years ago"), ExperienceSignal::Unknown);
        assert_eq!(
            experience("In business 20 years; we need 3+ years in analytics"),
            range(3, None)
        );
    }

    #[test]
    fn earliest_plausible_candidate_wins() {
        assert_eq!(
            experience("Founded 100 years ago. Need 5+ years, ideally 8 years."),
            range(5, None)
        );
        assert_eq!(experience("9-4 years then 6 years of experience"), range(6, None));
        assert_eq!(experience("2.5 years"), ExperienceSignal::Unknown);
        assert_eq!(experience("lots of experience"), ExperienceSignal::Unknown);
    }

    fn parsed(raw: &str) -> SalaryRange {
        matchers()
            .salary_field(raw)
            .parsed()
            .cloned()
            .unwrap_or_else(|| panic!("expected '{raw}' to parse"))
    }

    #[test]
    fn salary_field_formats() {
        let r = parsed("$130,000 - $160,000");
        assert_eq!((r.low, r.high, r.period), (130_000, 160_000, PayPeriod::Annual));
        assert_eq!(r.currency, "USD");

        let r = parsed("$120-150k");
        assert_eq!((r.low, r.high), (120_000, 150_000));

        let r = parsed("$140K to $175K per year");
        assert_eq!((r.low, r.high), (140_000, 175_000));

        let r = parsed("$50 - $70/hr");
        assert_eq!((r.low, r.high, r.period), (104_000, 145_600, PayPeriod::Hourly));

        let r = parsed("$10,000-$12,500 per month");
        assert_eq!((r.low, r.high, r.period), (120_000, 150_000, PayPeriod::Monthly));

        let r = parsed("$155,000");
        assert_eq!((r.low, r.high), (155_000, 155_000));
    }

    #[test]
    fn salary_field_unparsed_cases() {
        let m = matchers();
        for raw in [
            "€60,000 - €80,000",
            "CAD $100k-$120k",
            "Competitive",
            "$160,000 - $130,000",
            "$0 - $0",
        ] {
            assert_eq!(
                m.salary_field(raw),
                SalarySignal::Unparsed { raw: raw.to_string() },
                "{raw}"
            );
        }
    }

    #[test]
    fn salary_in_body_requires_explicit_range() {
        let m = matchers();
        let found = m
            .salary_in_body("The band is $150,000 - $180,000 plus equity.")
            .unwrap();
        assert_eq!(found.parsed().map(|r| (r.low, r.high)), Some((150_000, 180_000)));
        assert!(m.salary_in_body("We raised $40M last year.").is_none());
        assert!(m.salary_in_body("No numbers here").is_none());
    }

    fn company(text: &str) -> CompanySignal {
        matchers().company(&normalize(text))
    }

    #[test]
    fn remote_policy_precedence() {
        assert_eq!(
            company("Fully remote team, occasional on-site offsites").remote_policy,
            Some(RemotePolicy::Remote)
        );
        assert_eq!(
            company("Hybrid role, remote Fridays").remote_policy,
            Some(RemotePolicy::Hybrid)
        );
        assert_eq!(
            company("This role is on-site in Austin").remote_policy,
            Some(RemotePolicy::Onsite)
        );
        assert_eq!(company("Remote OK").remote_policy, Some(RemotePolicy::Remote));
        assert_eq!(company("100% remote").remote_policy, Some(RemotePolicy::Remote));
        assert_eq!(company("Austin, TX").remote_policy, None);
    }

    #[test]
    fn company_size_and_stage() {
        let c = company("Series B startup with 50-150 employees");
        assert_eq!(c.size, Some(CompanySize::Small));
        assert_eq!(c.stage, Some(CompanyStage::SeriesB));

        let c = company("We are 1,200 people strong and publicly traded on NASDAQ");
        assert_eq!(c.size, Some(CompanySize::Large));
        assert_eq!(c.stage, Some(CompanyStage::Public));

        let c = company("A Fortune 500 enterprise software leader");
        assert_eq!(c.size, Some(CompanySize::Large));
        assert_eq!(c.stage, Some(CompanyStage::Enterprise));

        assert_eq!(company("Series F growth company").stage, Some(CompanyStage::LateStage));
        assert_eq!(
            company("Late-stage startup, pre-IPO").stage,
            Some(CompanyStage::LateStage)
        );
        assert_eq!(company("Early-stage startup").stage, Some(CompanyStage::Startup));
        assert_eq!(company("Seed-funded, 12 people").size, Some(CompanySize::Small));
        assert_eq!(company("500 staff").size, Some(CompanySize::Mid));
        assert_eq!(company("Great culture"), CompanySignal::default());
    }

    #[test]
    fn experience_level_prefers_title_then_body_then_years() {
        let m = matchers();
        let level = |title: &str, body: &str| {
            let body = normalize(body);
            let years = m.experience(&body);
            m.experience_level(&normalize(title), &body, &years)
        };
        assert_eq!(
            level("Principal Product Manager", "3+ years"),
            Some(ExperienceBucket::Lead)
        );
        assert_eq!(level("Sr. PM, Growth", "2+ years"), Some(ExperienceBucket::Senior));
        assert_eq!(
            level("Associate Product Manager", "senior-level ownership"),
            Some(ExperienceBucket::Entry)
        );
        assert_eq!(
            level("Product Manager", "An entry-level role for new grads"),
            Some(ExperienceBucket::Entry)
        );
        assert_eq!(
            level("Product Manager", "You will lead senior stakeholders. 7+ years"),
            Some(ExperienceBucket::Senior)
        );
        assert_eq!(level("Product Manager", "4-6 years"), Some(ExperienceBucket::Mid));
        assert_eq!(level("Product Manager", "Great team"), None);
    }

    #[test]
    fn education_requirements() {
        let m = matchers();
        let text = normalize("Bachelor's degree required; MBA or Ph.D. a plus.");
        assert_eq!(
            m.education(&text),
            vec![Degree::Bachelor, Degree::Mba, Degree::Doctorate]
        );
        let text = normalize("Master's in Computer Science");
        assert_eq!(m.education(&text), vec![Degree::Master]);
        assert!(m.education(&normalize("no degree needed")).is_empty());
    }
}
