//! Positions a structured hiring need against a market analysis.

use crate::error::Result;
use crate::lexicon::Lexicon;
use crate::matchers::Matchers;
use crate::models::{ExperienceBucket, MarketAnalysis, RemotePolicy, SalaryRange};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiringNeed {
    pub role_title: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub experience_level: Option<ExperienceBucket>,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub remote_policy: Option<RemotePolicy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalaryPosition {
    Below,
    Within,
    Above,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketComparison {
    /// Requested skills the market also treats as common.
    pub aligned_skills: Vec<String>,
    /// Requested skills the lexicon knows but the market rarely asks for.
    pub uncommon_skills: Vec<String>,
    pub unrecognized_skills: Vec<String>,
    /// Common market skills the need leaves out, most frequent first.
    pub missing_common_skills: Vec<String>,
    pub requested_salary: Option<SalaryRange>,
    pub salary_position: Option<SalaryPosition>,
    /// Share of documents with a stated experience level that fall in the
    /// requested bucket.
    pub experience_level_share: Option<f64>,
    pub remote_matches_majority: Option<bool>,
}

pub fn compare_to_market(
    need: &HiringNeed,
    analysis: &MarketAnalysis,
    lexicon: &Lexicon,
) -> Result<MarketComparison> {
    let mut seen = BTreeSet::new();
    let mut aligned_skills = Vec::new();
    let mut uncommon_skills = Vec::new();
    let mut unrecognized_skills = Vec::new();
    for requested in &need.required_skills {
        match lexicon.canonicalize(requested) {
            Some(entry) if seen.insert(entry.name.clone()) => {
                if analysis.is_common(&entry.name) {
                    aligned_skills.push(entry.name.clone());
                } else {
                    uncommon_skills.push(entry.name.clone());
                }
            }
            Some(_) => {}
            None => unrecognized_skills.push(requested.trim().to_string()),
        }
    }
    let missing_common_skills = analysis
        .common_skills
        .iter()
        .filter(|s| !seen.contains(&s.name))
        .map(|s| s.name.clone())
        .collect();

    let requested_salary = match need.salary_range.as_deref() {
        Some(raw) if !raw.trim().is_empty() => Matchers::new()?.salary_field(raw).parsed().cloned(),
        _ => None,
    };
    let salary_position = requested_salary
        .as_ref()
        .zip(analysis.salary.as_ref())
        .map(|(need, market)| {
            if need.high < market.median_low {
                SalaryPosition::Below
            } else if need.low > market.median_high {
                SalaryPosition::Above
            } else {
                SalaryPosition::Within
            }
        });

    let experience_level_share = need.experience_level.and_then(|bucket| {
        let dist = &analysis.experience;
        let stated = dist.entry + dist.mid + dist.senior + dist.lead;
        (stated > 0).then(|| dist.count(bucket) as f64 / stated as f64)
    });

    let remote_matches_majority = need
        .remote_policy
        .zip(analysis.remote_policy_majority)
        .map(|(wanted, majority)| wanted == majority);

    Ok(MarketComparison {
        aligned_skills,
        uncommon_skills,
        unrecognized_skills,
        missing_common_skills,
        requested_salary,
        salary_position,
        experience_level_share,
        remote_matches_majority,
    })
}
