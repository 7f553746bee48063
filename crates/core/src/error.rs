use thiserror::Error;

pub type Result<T> = std::result::Result<T, InsightsError>;

#[derive(Debug, Error)]
pub enum InsightsError {
    /// Malformed input shape: a required text field is missing or blank, or an
    /// argument is out of range. Not retried.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Fewer valid documents than the configured floor.
    #[error("insufficient data: found {found} valid job descriptions, need at least {required}")]
    InsufficientData { found: usize, required: usize },
    #[error("invalid lexicon: {0}")]
    Lexicon(String),
    #[error("could not fingerprint arguments: {0}")]
    Fingerprint(String),
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl InsightsError {
    /// Number of valid documents found, for callers that want to ask for more input.
    pub fn documents_found(&self) -> Option<usize> {
        match self {
            InsightsError::InsufficientData { found, .. } => Some(*found),
            _ => None,
        }
    }
}
