use crate::error::InsightsError;
use crate::spans;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub lexicon: LexiconConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum share of valid documents a skill must appear in to count as common.
    pub skill_threshold: f64,
    pub min_job_descriptions: usize,
    /// Documents whose body has fewer words are excluded from analysis.
    pub min_body_words: usize,
    /// Mentions of one surface form needed to reach confidence 1.0.
    pub mentions_to_saturate: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            skill_threshold: 0.3,
            min_job_descriptions: 3,
            min_body_words: 50,
            mentions_to_saturate: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_seconds: u64,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 3600,
            max_entries: 100,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LexiconConfig {
    /// Optional TOML file replacing the built-in vocabulary.
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// `rules` or `phrases`.
    pub span_strategy: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            span_strategy: spans::RULES.to_string(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), InsightsError> {
        let threshold = self.analysis.skill_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(InsightsError::Validation(format!(
                "analysis.skill_threshold must be within [0, 1], got {threshold}"
            )));
        }
        if self.analysis.mentions_to_saturate == 0 {
            return Err(InsightsError::Validation(
                "analysis.mentions_to_saturate must be at least 1".into(),
            ));
        }
        if self.cache.max_entries == 0 {
            return Err(InsightsError::Validation(
                "cache.max_entries must be at least 1".into(),
            ));
        }
        if self.cache.ttl_seconds == 0 {
            return Err(InsightsError::Validation(
                "cache.ttl_seconds must be at least 1".into(),
            ));
        }
        if !spans::STRATEGIES.contains(&self.extraction.span_strategy.as_str()) {
            return Err(InsightsError::Validation(format!(
                "extraction.span_strategy must be one of {:?}, got '{}'",
                spans::STRATEGIES,
                self.extraction.span_strategy
            )));
        }
        Ok(())
    }
}

/// Layers built-in defaults, a config file, and `INSIGHTS__*` environment variables.
pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();
    let mut settings = config::Config::builder()
        .set_default("analysis.skill_threshold", defaults.analysis.skill_threshold)?
        .set_default(
            "analysis.min_job_descriptions",
            defaults.analysis.min_job_descriptions as u64,
        )?
        .set_default("analysis.min_body_words", defaults.analysis.min_body_words as u64)?
        .set_default(
            "analysis.mentions_to_saturate",
            defaults.analysis.mentions_to_saturate as u64,
        )?
        .set_default("cache.enabled", defaults.cache.enabled)?
        .set_default("cache.ttl_seconds", defaults.cache.ttl_seconds)?
        .set_default("cache.max_entries", defaults.cache.max_entries as u64)?
        .set_default("extraction.span_strategy", defaults.extraction.span_strategy)?;
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("INSIGHTS")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );
    let cfg: AppConfig = settings.build()?.try_deserialize()?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.analysis.skill_threshold, 0.3);
        assert_eq!(cfg.cache.ttl_seconds, 3600);
    }

    #[test]
    fn rejects_threshold_out_of_range() {
        let mut cfg = AppConfig::default();
        cfg.analysis.skill_threshold = 1.5;
        assert!(matches!(cfg.validate(), Err(InsightsError::Validation(_))));
    }

    #[test]
    fn rejects_unknown_span_strategy() {
        let mut cfg = AppConfig::default();
        cfg.extraction.span_strategy = "transformer".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[analysis]\nskill_threshold = 0.5\n\n[cache]\nmax_entries = 7"
        )
        .unwrap();
        let cfg = load(Some(file.path().to_str().unwrap())).unwrap();
        assert_eq!(cfg.analysis.skill_threshold, 0.5);
        assert_eq!(cfg.analysis.min_job_descriptions, 3);
        assert_eq!(cfg.cache.max_entries, 7);
        assert_eq!(cfg.cache.ttl_seconds, 3600);
    }

    #[test]
    fn invalid_file_values_are_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[analysis]\nskill_threshold = -0.1").unwrap();
        assert!(load(Some(file.path().to_str().unwrap())).is_err());
    }
}
