// =============================================================================
// Error Types
// =============================================================================
//
// One error enum covers the whole selection pipeline. The variants fall into
// two groups with different propagation rules:
//
//   RECOVERABLE (per candidate):
//     - ConvergenceFailure: one candidate fit did not converge. The
//       enumerator records it in the audit list and keeps fitting the
//       remaining candidates.
//
//   FATAL (abort the pipeline):
//     - Everything else. These carry enough context (term name, candidate
//       index, computed n and k) to diagnose the problem without re-running.
//
// =============================================================================

use thiserror::Error;

/// Errors produced by the multi-model inference pipeline.
#[derive(Debug, Clone, Error)]
pub enum MminferError {
    /// A single candidate fit did not converge.
    ///
    /// This is the only recoverable kind: the enumerator records the failure
    /// and continues with the remaining candidates.
    #[error("candidate {candidate} did not converge: {detail}")]
    ConvergenceFailure { candidate: usize, detail: String },

    /// The small-sample correction is undefined for this n and k.
    ///
    /// AICc divides by n - k - 1; when that is zero or negative the
    /// criterion has no meaning. Pick a different criterion or a simpler
    /// global model.
    #[error(
        "AICc undefined: effective sample size n = {n} with k = {k} parameters \
         leaves n - k - 1 <= 0"
    )]
    InsufficientSampleSize { n: f64, k: usize },

    /// Enumeration would exceed the configured candidate ceiling.
    ///
    /// Raised before any fitting starts. 2^T grows fast; trim the global
    /// model or raise the ceiling deliberately.
    #[error("enumeration would produce {count} candidates, above the ceiling of {ceiling}")]
    TooManyCandidates { count: usize, ceiling: usize },

    /// Top-set selection produced no models.
    #[error("top-set selection produced no models: {0}")]
    EmptySelection(String),

    /// A required column is absent or contains missing values.
    #[error("missing data in column '{0}'")]
    MissingData(String),

    /// Array or table dimensions do not line up.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// An input collection was empty where data is required.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// A value outside its valid domain (non-finite likelihood, confidence
    /// level outside (0, 1), constant column, ...).
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// A matrix operation failed, usually from a singular design matrix.
    #[error("linear algebra failure: {0}")]
    LinearAlgebra(String),
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, MminferError>;
