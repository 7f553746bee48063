use anyhow::{Context, Result};
use insights_core::comparison::HiringNeed;
use insights_core::models::{parse_documents, RoleDocument};
use std::path::Path;

/// Reads a JSON array of role documents.
pub fn load_documents(path: &Path) -> Result<Vec<RoleDocument>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading documents from {}", path.display()))?;
    let docs = parse_documents(&content)
        .with_context(|| format!("parsing documents from {}", path.display()))?;
    tracing::info!("Loaded {} documents from {}", docs.len(), path.display());
    Ok(docs)
}

pub fn load_need(path: &Path) -> Result<HiringNeed> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading hiring need from {}", path.display()))?;
    let need: HiringNeed = serde_json::from_str(&content)
        .with_context(|| format!("parsing hiring need from {}", path.display()))?;
    if need.role_title.trim().is_empty() {
        anyhow::bail!("hiring need in {} has an empty role_title", path.display());
    }
    Ok(need)
}
