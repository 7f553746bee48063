//! Core library: skill lexicon, signal extraction, market aggregation, and
//! memoized entry points.

pub mod aggregator;
pub mod cache;
pub mod comparison;
pub mod config;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod lexicon;
pub mod matchers;
pub mod models;
pub mod sections;
pub mod spans;

pub use engine::InsightsEngine;
pub use error::{InsightsError, Result};
