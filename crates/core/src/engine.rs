//! Cached entry points wiring configuration, lexicon, extractor, and
//! aggregator together.

use crate::aggregator::{aggregate_extractions, validate_threshold, Aggregator};
use crate::cache::{CacheStats, Clock, Fingerprint, MemoCache, SystemClock};
use crate::config::{AnalysisConfig, AppConfig};
use crate::error::Result;
use crate::extractor::{Extractor, ExtractorOptions};
use crate::lexicon::Lexicon;
use crate::models::{ExtractionResult, MarketAnalysis, RoleDocument};
use crate::spans;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const EXTRACT_SCOPE: &str = "extract";
const AGGREGATE_SCOPE: &str = "aggregate";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineCacheStats {
    pub extraction: CacheStats,
    pub aggregation: CacheStats,
}

#[derive(Debug)]
struct Caches {
    extractions: MemoCache<Fingerprint, ExtractionResult>,
    analyses: MemoCache<Fingerprint, MarketAnalysis>,
}

#[derive(Debug)]
pub struct InsightsEngine {
    aggregator: Aggregator,
    analysis: AnalysisConfig,
    caches: Option<Caches>,
}

impl InsightsEngine {
    /// Builds an engine from configuration, loading the lexicon file if one
    /// is configured.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let lexicon = match &config.lexicon.path {
            Some(path) => Lexicon::load(Path::new(path))?,
            None => Lexicon::default(),
        };
        let engine = Self::new(config, Arc::new(lexicon))?;
        info!(
            "Engine ready: {} skills, span strategy '{}', cache {}",
            engine.lexicon().len(),
            config.extraction.span_strategy,
            if config.cache.enabled { "enabled" } else { "disabled" }
        );
        Ok(engine)
    }

    pub fn new(config: &AppConfig, lexicon: Arc<Lexicon>) -> Result<Self> {
        Self::with_clock(config, lexicon, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: &AppConfig,
        lexicon: Arc<Lexicon>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let spans = spans::from_strategy(&config.extraction.span_strategy)?;
        let extractor = Extractor::new(
            lexicon,
            spans,
            ExtractorOptions {
                mentions_to_saturate: config.analysis.mentions_to_saturate,
            },
        )?;
        let caches = config.cache.enabled.then(|| {
            let ttl = Duration::from_secs(config.cache.ttl_seconds);
            let capacity = config.cache.max_entries;
            Caches {
                extractions: MemoCache::with_clock(capacity, ttl, Arc::clone(&clock)),
                analyses: MemoCache::with_clock(capacity, ttl, Arc::clone(&clock)),
            }
        });
        Ok(Self {
            aggregator: Aggregator::new(extractor, config.analysis.min_body_words),
            analysis: config.analysis.clone(),
            caches,
        })
    }

    pub fn lexicon(&self) -> &Arc<Lexicon> {
        self.aggregator.extractor().lexicon()
    }

    pub fn extract(&self, doc: &RoleDocument) -> Arc<ExtractionResult> {
        let extractor = self.aggregator.extractor();
        let Some(caches) = &self.caches else {
            return Arc::new(extractor.extract(doc));
        };
        match Fingerprint::of(EXTRACT_SCOPE, doc) {
            Ok(key) => caches
                .extractions
                .get_or_try_insert_with(key, || {
                    Ok::<_, std::convert::Infallible>(extractor.extract(doc))
                })
                .unwrap_or_else(|never| match never {}),
            Err(e) => {
                warn!("Extracting '{}' uncached: {}", doc.title, e);
                Arc::new(extractor.extract(doc))
            }
        }
    }

    /// Aggregates with the configured threshold and document floor.
    pub fn aggregate(&self, docs: &[RoleDocument]) -> Result<Arc<MarketAnalysis>> {
        self.aggregate_with(
            docs,
            self.analysis.skill_threshold,
            self.analysis.min_job_descriptions,
        )
    }

    pub fn aggregate_with(
        &self,
        docs: &[RoleDocument],
        threshold: f64,
        min_documents: usize,
    ) -> Result<Arc<MarketAnalysis>> {
        let Some(caches) = &self.caches else {
            let analysis = self.aggregator.aggregate(docs, threshold, min_documents)?;
            return Ok(Arc::new(analysis));
        };
        validate_threshold(threshold)?;
        let key = Fingerprint::of(
            AGGREGATE_SCOPE,
            &(docs, threshold, min_documents, self.analysis.min_body_words),
        )?;
        caches.analyses.get_or_try_insert_with(key, || {
            debug!("Computing market analysis for {} documents ({})", docs.len(), key);
            let valid = self.aggregator.prepare(docs, threshold, min_documents)?;
            let extractions: Vec<Arc<ExtractionResult>> =
                valid.iter().map(|doc| self.extract(doc)).collect();
            Ok(aggregate_extractions(
                &extractions,
                docs.len() - valid.len(),
                threshold,
            ))
        })
    }

    /// `None` when caching is disabled.
    pub fn cache_stats(&self) -> Option<EngineCacheStats> {
        self.caches.as_ref().map(|c| EngineCacheStats {
            extraction: c.extractions.stats(),
            aggregation: c.analyses.stats(),
        })
    }

    pub fn clear_caches(&self) {
        if let Some(caches) = &self.caches {
            caches.extractions.clear();
            caches.analyses.clear();
        }
    }
}
