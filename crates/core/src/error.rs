use thiserror::Error;

pub type Result<T, E = ArbitrageError> = std::result::Result<T, E>;

/// Failures surfaced to whoever asked for an evaluation.
///
/// Nothing in the pricing code logs or swallows these; skip-and-continue is a decision
/// for the batch caller (see [`crate::scanner::ArbitrageScanner::scan`]).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArbitrageError {
    /// Total cost is zero, so ROI has no meaning.
    #[error("ROI is undefined: total cost is zero")]
    DivisionUndefined,

    /// An upstream lookup (catalog, page extractor) failed.
    #[error("{collaborator} unavailable: {detail}")]
    CollaboratorUnavailable {
        collaborator: &'static str,
        detail: String,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The catalog answered, but has no record for the identifier.
    #[error("not found: {0}")]
    NotFound(String),
}

impl ArbitrageError {
    pub fn invalid(detail: impl Into<String>) -> Self {
        Self::InvalidInput(detail.into())
    }

    pub fn unavailable(collaborator: &'static str, err: &anyhow::Error) -> Self {
        Self::CollaboratorUnavailable {
            collaborator,
            detail: format!("{err:#}"),
        }
    }
}
