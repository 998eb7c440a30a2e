// =============================================================================
// Sub-model Enumeration and Ranking
// =============================================================================
//
// This is the heart of the library: generate every reduced form of the
// global model, fit each one, score each fit, and rank.
//
// HOW ENUMERATION WORKS
// ---------------------
// With T non-fixed terms there are 2^T subsets. Each subset is a bitmask
// over the global model's term ordering, visited in ascending mask order:
// a fixed, reproducible traversal, so re-running on identical input yields
// identical candidate order before ranking. Subsets violating marginality
// (an interaction without its component main effects) are skipped when the
// policy is on, which it is by default.
//
// The intercept and the random-effects grouping structure are fixed: they
// are part of every candidate and never toggled.
//
// COST
// ----
// Exponential by design. Ten terms is 1024 fits; twenty terms is a million.
// Enumeration fails fast with TooManyCandidates when 2^T exceeds the
// configured ceiling, BEFORE any fitting starts, rather than silently
// running an intractable job.
//
// FAILED FITS
// -----------
// A candidate whose fit does not converge is recorded in an audit list with
// no score and excluded from the ranking; its siblings are unaffected. Any
// other fitter error aborts the whole run.
//
// =============================================================================

use rayon::prelude::*;

use crate::criteria::{akaike_weights, deltas, Criterion};
use crate::error::{MminferError, Result};
use crate::fitter::{FittedModel, ModelFitter};
use crate::terms::{CandidateModel, GlobalModel};

// =============================================================================
// Configuration
// =============================================================================

/// Options controlling enumeration, fitting, and scoring.
///
/// There is no `Default`: the effective sample size has no defensible
/// default for grouped data (see the criteria module), so construction
/// forces the caller to state it.
#[derive(Debug, Clone)]
pub struct DredgeConfig {
    /// Criterion used to score and rank candidates.
    pub criterion: Criterion,

    /// Effective sample size n handed to the criterion. By convention the
    /// number of level-1 observations; override deliberately if you follow
    /// a different convention for hierarchical data.
    pub sample_size: f64,

    /// Refuse to enumerate more than this many subsets (checked against
    /// 2^T before the marginality filter, and before any fitting).
    /// Default: 10_000.
    pub max_candidates: usize,

    /// Require every interaction's component main effects to be present.
    /// Default: true.
    pub marginality: bool,

    /// Fit candidates in parallel across the rayon thread pool. Output
    /// order is identical either way. Default: false.
    pub parallel: bool,

    /// Print a progress line per fitted candidate to stderr.
    /// Default: false.
    pub verbose: bool,
}

impl DredgeConfig {
    pub fn new(criterion: Criterion, sample_size: f64) -> DredgeConfig {
        DredgeConfig {
            criterion,
            sample_size,
            max_candidates: 10_000,
            marginality: true,
            parallel: false,
            verbose: false,
        }
    }
}

// =============================================================================
// Ranking Data Model
// =============================================================================

/// A candidate that was fitted and scored, with its place in the ranking.
#[derive(Debug, Clone)]
pub struct RankedEntry {
    pub candidate: CandidateModel,
    pub fitted: FittedModel,
    /// Criterion value for this fit.
    pub criterion_value: f64,
    /// Criterion value minus the best value in the full ranked set; 0 for
    /// the best model.
    pub delta: f64,
    /// Akaike weight, normalized over the full ranked set (sums to 1).
    pub weight: f64,
}

/// A candidate whose fit did not converge. Kept for audit and reporting;
/// never ranked.
#[derive(Debug, Clone)]
pub struct FitFailure {
    pub candidate: CandidateModel,
    pub message: String,
}

/// The complete ranked set of successfully fitted candidates, sorted
/// ascending by criterion value (best first), plus the audit list of
/// candidates that failed to converge.
///
/// Akaike weights always refer to this full set: their denominator is the
/// sum over every converged candidate. Filtering to a top set does not
/// change them; the top set keeps its own renormalized copy for averaging.
#[derive(Debug, Clone)]
pub struct ModelRanking {
    criterion: Criterion,
    sample_size: f64,
    entries: Vec<RankedEntry>,
    failures: Vec<FitFailure>,
}

impl ModelRanking {
    /// Rank externally scored fits.
    ///
    /// `scored` pairs each candidate with its fitted model; the criterion is
    /// evaluated here so deltas and weights are always consistent with the
    /// stated criterion and sample size. The sort is stable: candidates with
    /// equal criterion values keep their enumeration order.
    pub fn from_fits(
        criterion: Criterion,
        sample_size: f64,
        fits: Vec<(CandidateModel, FittedModel)>,
        failures: Vec<FitFailure>,
    ) -> Result<ModelRanking> {
        let mut entries: Vec<RankedEntry> = Vec::with_capacity(fits.len());
        for (candidate, fitted) in fits {
            let value =
                criterion.evaluate(fitted.log_likelihood(), fitted.n_parameters(), sample_size)?;
            entries.push(RankedEntry {
                candidate,
                fitted,
                criterion_value: value,
                delta: 0.0,
                weight: 0.0,
            });
        }

        // Stable sort keeps enumeration order among exact ties, which keeps
        // the whole pipeline reproducible.
        entries.sort_by(|a, b| a.criterion_value.total_cmp(&b.criterion_value));

        let values: Vec<f64> = entries.iter().map(|e| e.criterion_value).collect();
        if !values.is_empty() {
            let d = deltas(&values);
            let w = akaike_weights(&d);
            for (entry, (delta, weight)) in entries.iter_mut().zip(d.into_iter().zip(w)) {
                entry.delta = delta;
                entry.weight = weight;
            }
        }

        Ok(ModelRanking {
            criterion,
            sample_size,
            entries,
            failures,
        })
    }

    pub fn criterion(&self) -> Criterion {
        self.criterion
    }

    pub fn sample_size(&self) -> f64 {
        self.sample_size
    }

    /// Ranked entries, best first.
    pub fn entries(&self) -> &[RankedEntry] {
        &self.entries
    }

    /// Candidates that failed to converge, in enumeration order.
    pub fn failures(&self) -> &[FitFailure] {
        &self.failures
    }

    pub fn best(&self) -> Option<&RankedEntry> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Enumeration
// =============================================================================

/// Generate every valid reduced form of the global model, in a fixed
/// reproducible order (ascending presence bitmask).
///
/// Fails with `TooManyCandidates` when 2^T exceeds the ceiling, checked
/// up front so an intractable job dies before the first fit.
pub fn enumerate_candidates(
    global: &GlobalModel,
    config: &DredgeConfig,
) -> Result<Vec<CandidateModel>> {
    let t = global.n_terms();

    let total = 1usize
        .checked_shl(t as u32)
        .filter(|&count| count <= config.max_candidates)
        .ok_or(MminferError::TooManyCandidates {
            count: 1usize.checked_shl(t as u32).unwrap_or(usize::MAX),
            ceiling: config.max_candidates,
        })?;

    let mut candidates = Vec::new();
    for mask in 0..total as u64 {
        if config.marginality && !global.mask_respects_marginality(mask) {
            continue;
        }
        let terms: Vec<_> = global
            .terms()
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, term)| term.clone())
            .collect();
        candidates.push(CandidateModel::new(candidates.len(), mask, terms));
    }

    Ok(candidates)
}

// =============================================================================
// Dredge: enumerate, fit, score, rank
// =============================================================================

/// Run the full enumerate → fit → score → rank pass.
///
/// Candidates are fitted independently, sequentially or across the rayon
/// pool when `config.parallel` is set. Each result carries its candidate
/// index and the collected list is re-sorted by that index, so completion
/// order never affects output order. A fit returning
/// [`MminferError::ConvergenceFailure`] (or a model flagged as not
/// converged) lands in the audit list; any other error aborts.
pub fn dredge<F>(global: &GlobalModel, fitter: &F, config: &DredgeConfig) -> Result<ModelRanking>
where
    F: ModelFitter + Sync,
{
    let candidates = enumerate_candidates(global, config)?;
    let n_candidates = candidates.len();

    let mut results: Vec<(CandidateModel, Result<FittedModel>)> = if config.parallel {
        candidates
            .into_par_iter()
            .map(|candidate| {
                let fit = fitter.fit(&candidate);
                (candidate, fit)
            })
            .collect()
    } else {
        candidates
            .into_iter()
            .map(|candidate| {
                let fit = fitter.fit(&candidate);
                if config.verbose {
                    let status = match &fit {
                        Ok(m) => format!("logLik = {:.4}", m.log_likelihood()),
                        Err(e) => format!("failed: {}", e),
                    };
                    eprintln!(
                        "candidate {}/{}: {}",
                        candidate.index() + 1,
                        n_candidates,
                        status
                    );
                }
                (candidate, fit)
            })
            .collect()
    };

    // Restore enumeration order regardless of completion order.
    results.sort_by_key(|(candidate, _)| candidate.index());

    let mut fits = Vec::new();
    let mut failures = Vec::new();
    for (candidate, fit) in results {
        match fit {
            Ok(model) if model.converged() => fits.push((candidate, model)),
            Ok(_) => {
                // A fitter that reports non-convergence through the flag
                // instead of the error gets the same treatment.
                failures.push(FitFailure {
                    candidate,
                    message: "fitter reported non-convergence".to_string(),
                });
            }
            Err(MminferError::ConvergenceFailure { detail, .. }) => {
                failures.push(FitFailure {
                    candidate,
                    message: detail,
                });
            }
            Err(other) => return Err(other),
        }
    }

    if config.verbose {
        eprintln!(
            "dredge: {} of {} candidates converged ({} failed)",
            fits.len(),
            n_candidates,
            failures.len()
        );
    }

    ModelRanking::from_fits(config.criterion, config.sample_size, fits, failures)
}

// =============================================================================
// Tests
// =============================================================================
