// =============================================================================
// mminfer Core Library
// =============================================================================
//
// Information-theoretic multi-model inference: given a "global" model (the
// maximal set of terms worth considering), enumerate every valid reduced
// form, fit each through a pluggable fitting backend, rank the fits by an
// information criterion, keep the models with substantial support, and
// average their coefficients weighted by model likelihood.
//
// PIPELINE
// --------
//
//     GlobalModel --enumerate--> CandidateModel* --fit--> FittedModel*
//                 --score/rank--> ModelRanking --select--> TopSet
//                 --average--> AveragedCoefficient*
//
// STRUCTURE
// ---------
// The library is organized into modules, each handling a specific concern:
//
//   - terms:    the data model (terms, global and candidate models, family)
//   - fitter:   the fitting-backend capability trait and fitted-model types
//   - criteria: AIC / AICc / BIC, deltas, Akaike weights
//   - dredge:   sub-model enumeration, fitting orchestration, ranking
//   - select:   delta-threshold top-set selection
//   - average:  full/conditional averaging, unconditional SEs, importance
//   - error:    error types used throughout the library
//
// Every component is a pure request/response transform: no state persists
// across calls beyond the immutability of the global model and the dataset
// held by the fitting backend.
//
// =============================================================================

pub mod average;
pub mod criteria;
pub mod dredge;
pub mod error;
pub mod fitter;
pub mod select;
pub mod terms;

// Re-export the items a typical pipeline touches, so users can write
// `use mminfer_core::dredge` instead of digging through modules.
pub use average::{AverageConfig, AveragedCoefficient};
pub use criteria::{akaike_weights, deltas, Criterion};
pub use dredge::{dredge, enumerate_candidates, DredgeConfig, FitFailure, ModelRanking, RankedEntry};
pub use error::{MminferError, Result};
pub use fitter::{Coefficient, FittedModel, ModelFitter};
pub use select::TopSet;
pub use terms::{CandidateModel, Family, GlobalModel, GlobalModelBuilder, Term, INTERCEPT};
