// =============================================================================
// mminfer
// =============================================================================
//
// User-facing surface over `mminfer-core`: everything needed to run an
// information-theoretic multi-model analysis end to end on a numeric table.
//
//   - dataset:     column-oriented data with na.fail validation
//   - design:      candidate model -> design matrix
//   - families:    the mathematics behind the core's family tags
//   - glm:         a bundled IRLS fixed-effects GLM fitting backend
//   - standardize: explicit, reversible predictor standardization
//   - report:      plain-text selection and coefficient tables
//
// A typical run:
//
//     let (scaled, _record) = standardize(&data, &global)?;
//     let fitter = GlmFitter::new(&scaled, &global, GlmConfig::default())?;
//     let ranking = dredge(&global, &fitter, &config)?;
//     let top = ranking.select(2.0)?;
//     let averaged = top.average(&AverageConfig::default())?;
//     println!("{}", selection_table(&top, &global));
//
// The core types are re-exported so most users only depend on this crate.
//
// =============================================================================

pub mod dataset;
pub mod design;
pub mod families;
pub mod glm;
pub mod report;
pub mod standardize;

pub use dataset::Dataset;
pub use design::{design_matrix, term_column};
pub use families::FamilyOps;
pub use glm::{GlmConfig, GlmFitter};
pub use report::{coefficient_table, selection_table, CoefficientTable, SelectionTable};
pub use standardize::{standardize, Standardization, VariableScale};

// Core re-exports: the whole pipeline through one crate.
pub use mminfer_core::{
    akaike_weights, deltas, dredge, enumerate_candidates, AverageConfig, AveragedCoefficient,
    CandidateModel, Coefficient, Criterion, DredgeConfig, Family, FitFailure, FittedModel,
    GlobalModel, MminferError, ModelFitter, ModelRanking, RankedEntry, Result, Term, TopSet,
    INTERCEPT,
};
