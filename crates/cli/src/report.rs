//! Human-readable and JSON renderings of engine output.

use insights_core::comparison::{MarketComparison, SalaryPosition};
use insights_core::lexicon::Lexicon;
use insights_core::models::{
    ExperienceSignal, ExtractionResult, MarketAnalysis, PhraseFrequency, RoleDocument,
    SalarySignal, SkillCategory,
};
use serde::Serialize;
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt::Write;

#[derive(Debug, Serialize)]
pub struct AnalysisReport<'a> {
    pub analysis: &'a MarketAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<&'a MarketComparison>,
}

#[derive(Debug, Serialize)]
pub struct ExtractionReport<'a> {
    pub title: &'a str,
    pub company: &'a str,
    pub extraction: &'a ExtractionResult,
}

/// snake_case name of a unit enum value, as it appears in JSON output.
fn label<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn counts<K: Serialize>(table: &BTreeMap<K, u32>) -> String {
    if table.is_empty() {
        return "none".to_string();
    }
    table
        .iter()
        .map(|(k, n)| format!("{} {}", label(k), n))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Formats whole dollars with thousands separators: 140000 -> "$140,000".
pub fn dollars(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push('$');
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

const PHRASES_SHOWN: usize = 5;

fn phrases(out: &mut String, heading: &str, table: &[PhraseFrequency], documents: usize) {
    if table.is_empty() {
        return;
    }
    let _ = writeln!(out, "{heading}:");
    for entry in table.iter().take(PHRASES_SHOWN) {
        let _ = writeln!(out, "  {:>3}/{:<3} {}", entry.frequency, documents, entry.phrase);
    }
}

fn experience(signal: &ExperienceSignal) -> String {
    match signal {
        ExperienceSignal::Range {
            min_years,
            max_years: Some(max),
        } => format!("{min_years}-{max} years"),
        ExperienceSignal::Range {
            min_years,
            max_years: None,
        } => format!("{min_years}+ years"),
        ExperienceSignal::Unknown => "unknown".to_string(),
    }
}

pub fn render_analysis(analysis: &MarketAnalysis, comparison: Option<&MarketComparison>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Documents analyzed: {} ({} excluded as too short)",
        analysis.document_count, analysis.excluded_documents
    );
    let _ = writeln!(out, "\nCommon skills (threshold {:.2}):", analysis.threshold);
    if analysis.common_skills.is_empty() {
        let _ = writeln!(out, "  none");
    }
    for skill in &analysis.common_skills {
        let _ = writeln!(
            out,
            "  {:<32} {:<14} {:>3}/{:<3} {:>4.0}%  confidence {:.2}",
            skill.name,
            skill.category.as_str(),
            skill.frequency,
            analysis.document_count,
            skill.share * 100.0,
            skill.mean_confidence
        );
    }
    let _ = writeln!(out, "Category breakdown: {}", counts(&analysis.category_breakdown));

    let _ = writeln!(out);
    match &analysis.salary {
        Some(stats) => {
            let _ = writeln!(
                out,
                "Salary ({} parsed ranges): median {} - {}, observed {} - {}",
                stats.sample_size,
                dollars(stats.median_low),
                dollars(stats.median_high),
                dollars(stats.min),
                dollars(stats.max)
            );
        }
        None => {
            let _ = writeln!(out, "Salary: no parseable ranges");
        }
    }
    if analysis.salary_unparsed > 0 {
        let _ = writeln!(out, "  {} salary strings could not be parsed", analysis.salary_unparsed);
    }

    let dist = &analysis.experience;
    let _ = write!(
        out,
        "Experience: entry {}, mid {}, senior {}, lead {}, unspecified {}",
        dist.entry, dist.mid, dist.senior, dist.lead, dist.unspecified
    );
    match analysis.mean_min_years {
        Some(mean) => {
            let _ = writeln!(out, "; mean minimum {mean:.1} years");
        }
        None => {
            let _ = writeln!(out);
        }
    }
    let _ = writeln!(out, "Experience level: {}", counts(&analysis.experience_level_counts));
    let majority = |m: Option<String>| m.unwrap_or_else(|| "n/a".to_string());
    let _ = writeln!(
        out,
        "Remote policy: {} ({})",
        majority(analysis.remote_policy_majority.map(|p| label(&p))),
        counts(&analysis.remote_policy_counts)
    );
    let _ = writeln!(
        out,
        "Company size: {} ({})",
        majority(analysis.company_size_majority.map(|s| label(&s))),
        counts(&analysis.company_size_counts)
    );
    let _ = writeln!(out, "Company stage: {}", counts(&analysis.company_stage_counts));
    let _ = writeln!(
        out,
        "Education: {:.0}% name a degree ({})",
        analysis.degree_requirement_share * 100.0,
        counts(&analysis.degree_counts)
    );

    let listed = [
        ("Frequent responsibilities", &analysis.common_responsibilities),
        ("Frequent qualifications", &analysis.common_qualifications),
        ("Frequent nice-to-haves", &analysis.common_nice_to_have),
    ];
    if listed.iter().any(|(_, table)| !table.is_empty()) {
        out.push('\n');
    }
    for (heading, table) in listed {
        phrases(&mut out, heading, table, analysis.document_count);
    }

    if let Some(cmp) = comparison {
        render_comparison(&mut out, cmp);
    }
    out
}

fn list(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

fn render_comparison(out: &mut String, cmp: &MarketComparison) {
    let _ = writeln!(out, "\nHiring need vs market:");
    let _ = writeln!(out, "  aligned with market:   {}", list(&cmp.aligned_skills));
    let _ = writeln!(out, "  uncommon in market:    {}", list(&cmp.uncommon_skills));
    let _ = writeln!(out, "  not in lexicon:        {}", list(&cmp.unrecognized_skills));
    let _ = writeln!(out, "  common but not listed: {}", list(&cmp.missing_common_skills));
    if let (Some(range), Some(position)) = (&cmp.requested_salary, cmp.salary_position) {
        let where_ = match position {
            SalaryPosition::Below => "below",
            SalaryPosition::Within => "within",
            SalaryPosition::Above => "above",
        };
        let _ = writeln!(
            out,
            "  salary {} - {} is {} the market median band",
            dollars(range.low),
            dollars(range.high),
            where_
        );
    }
    if let Some(share) = cmp.experience_level_share {
        let _ = writeln!(
            out,
            "  {:.0}% of roles with a stated level ask for the same experience",
            share * 100.0
        );
    }
    if let Some(matches) = cmp.remote_matches_majority {
        let verdict = if matches { "matches" } else { "differs from" };
        let _ = writeln!(out, "  remote policy {verdict} the market majority");
    }
}

pub fn render_extractions<E: Borrow<ExtractionResult>>(
    docs: &[RoleDocument],
    results: &[E],
) -> String {
    let mut out = String::new();
    for (doc, result) in docs.iter().zip(results) {
        let result = result.borrow();
        let _ = writeln!(out, "{} @ {}", doc.title, doc.company);
        let skills = result
            .skills
            .iter()
            .map(|s| format!("{} ({:.2})", s.name, s.confidence))
            .collect::<Vec<_>>();
        let _ = writeln!(out, "  skills:     {}", list(&skills));
        let level = result
            .experience_level
            .map(|l| label(&l))
            .unwrap_or_else(|| "?".into());
        let _ = writeln!(
            out,
            "  experience: {} (level {level})",
            experience(&result.experience)
        );
        let salary = match &result.salary {
            Some(SalarySignal::Parsed(range)) => format!(
                "{} - {} ({} quoted)",
                dollars(range.low),
                dollars(range.high),
                label(&range.period)
            ),
            Some(SalarySignal::Unparsed { raw }) => format!("unparsed: {raw:?}"),
            None => "none".to_string(),
        };
        let _ = writeln!(out, "  salary:     {salary}");
        let company = &result.company;
        let _ = writeln!(
            out,
            "  company:    size {}, stage {}, remote {}",
            company.size.map(|v| label(&v)).unwrap_or_else(|| "?".into()),
            company.stage.map(|v| label(&v)).unwrap_or_else(|| "?".into()),
            company
                .remote_policy
                .map(|v| label(&v))
                .unwrap_or_else(|| "?".into())
        );
        let degrees: Vec<String> = result.education.iter().map(label).collect();
        let _ = writeln!(out, "  education:  {}", list(&degrees));
        let sections = &result.sections;
        if !sections.is_empty() {
            let _ = writeln!(
                out,
                "  sections:   {} responsibilities, {} qualifications, {} nice-to-have",
                sections.responsibilities.len(),
                sections.qualifications.len(),
                sections.nice_to_have.len()
            );
        }
    }
    out
}

pub fn render_lexicon(lexicon: &Lexicon, category: Option<SkillCategory>) -> String {
    let mut out = String::new();
    for entry in lexicon
        .entries()
        .iter()
        .filter(|e| category.map_or(true, |c| e.category == c))
    {
        let _ = write!(out, "{:<32} {:<14}", entry.name, entry.category.as_str());
        if !entry.aliases.is_empty() {
            let _ = write!(out, " {}", entry.aliases.join(", "));
        }
        out.push('\n');
    }
    out
}
