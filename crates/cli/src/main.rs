use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::input;
use cli::report::{self, AnalysisReport, ExtractionReport};
use insights_core::comparison::compare_to_market;
use insights_core::config;
use insights_core::lexicon::Lexicon;
use insights_core::models::SkillCategory;
use insights_core::{InsightsEngine, InsightsError};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            input,
            need,
            threshold,
            min_documents,
            json,
        } => {
            let engine = InsightsEngine::from_config(&cfg)?;
            run_analyze(
                &engine,
                &input,
                need.as_deref(),
                threshold.unwrap_or(cfg.analysis.skill_threshold),
                min_documents.unwrap_or(cfg.analysis.min_job_descriptions),
                json,
            )
        }
        Commands::Extract { input, json } => {
            let engine = InsightsEngine::from_config(&cfg)?;
            run_extract(&engine, &input, json)
        }
        Commands::Lexicon { category, json } => {
            let lexicon = match &cfg.lexicon.path {
                Some(path) => Lexicon::load(Path::new(path))?,
                None => Lexicon::default(),
            };
            run_lexicon(&lexicon, category.as_deref(), json)
        }
    }
}

#[derive(Parser)]
#[command(name = "hiring-insights")]
#[command(about = "Market insights from a corpus of job descriptions", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate job descriptions into a market analysis
    Analyze {
        /// JSON array of job descriptions
        #[arg(short, long)]
        input: PathBuf,
        /// JSON hiring need to compare against the market
        #[arg(long)]
        need: Option<PathBuf>,
        /// Share of documents a skill must appear in (overrides config)
        #[arg(long)]
        threshold: Option<f64>,
        /// Minimum valid documents required (overrides config)
        #[arg(long)]
        min_documents: Option<usize>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Show per-document signals
    Extract {
        #[arg(short, long)]
        input: PathBuf,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// List the skill lexicon
    Lexicon {
        /// Only skills in this category
        #[arg(long)]
        category: Option<String>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

fn run_analyze(
    engine: &InsightsEngine,
    input: &Path,
    need: Option<&Path>,
    threshold: f64,
    min_documents: usize,
    json: bool,
) -> Result<()> {
    let docs = input::load_documents(input)?;
    let analysis = match engine.aggregate_with(&docs, threshold, min_documents) {
        Ok(analysis) => analysis,
        Err(InsightsError::InsufficientData { found, required }) => {
            anyhow::bail!(
                "only {found} of {} job descriptions are long enough to analyze; provide at least {required}",
                docs.len()
            );
        }
        Err(e) => return Err(e.into()),
    };
    let comparison = match need {
        Some(path) => {
            let need = input::load_need(path)?;
            Some(compare_to_market(&need, &analysis, engine.lexicon())?)
        }
        None => None,
    };
    if json {
        let out = AnalysisReport {
            analysis: &analysis,
            comparison: comparison.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print!("{}", report::render_analysis(&analysis, comparison.as_ref()));
    }
    Ok(())
}

fn run_extract(engine: &InsightsEngine, input: &Path, json: bool) -> Result<()> {
    let docs = input::load_documents(input)?;
    let results: Vec<_> = docs.iter().map(|doc| engine.extract(doc)).collect();
    if json {
        let out: Vec<ExtractionReport> = docs
            .iter()
            .zip(&results)
            .map(|(doc, result)| ExtractionReport {
                title: &doc.title,
                company: &doc.company,
                extraction: result,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print!("{}", report::render_extractions(&docs, &results));
    }
    Ok(())
}

fn run_lexicon(lexicon: &Lexicon, category: Option<&str>, json: bool) -> Result<()> {
    let category = match category {
        Some(name) => Some(SkillCategory::parse(name).ok_or_else(|| {
            anyhow::anyhow!(
                "unknown category '{name}', expected one of {}",
                SkillCategory::ALL.map(|c| c.as_str()).join(", ")
            )
        })?),
        None => None,
    };
    if json {
        let entries: Vec<_> = lexicon
            .entries()
            .iter()
            .filter(|e| category.map_or(true, |c| e.category == c))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print!("{}", report::render_lexicon(lexicon, category));
    }
    Ok(())
}
