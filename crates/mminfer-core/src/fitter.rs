// =============================================================================
// Model Fitter Capability
// =============================================================================
//
// Maximum-likelihood fitting is deliberately NOT implemented here. The hard
// numerical work (IRLS for GLMs, Laplace or quadrature for mixed models)
// lives behind the `ModelFitter` trait, so the selection machinery can be
// developed and tested against a mock fitter with canned outputs, and real
// backends can be swapped without touching enumeration, ranking, or
// averaging.
//
// A fitter owns (or borrows) its dataset. The core never sees data: it hands
// a candidate to the fitter and gets back coefficients, a log-likelihood,
// and a parameter count.
//
// =============================================================================

use std::collections::BTreeMap;

use crate::error::{MminferError, Result};
use crate::terms::CandidateModel;

// =============================================================================
// Fitted Model
// =============================================================================

/// Point estimate and standard error for one coefficient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficient {
    pub estimate: f64,
    pub std_error: f64,
}

/// The output of fitting one candidate model.
///
/// Immutable after creation. Coefficients are keyed by term name (plus
/// `"(Intercept)"`), which is what the averager consumes; design-matrix
/// internals stay inside the fitting backend.
#[derive(Debug, Clone)]
pub struct FittedModel {
    coefficients: BTreeMap<String, Coefficient>,
    log_likelihood: f64,
    n_parameters: usize,
    converged: bool,
}

impl FittedModel {
    /// Assemble a fitted model from its parts.
    ///
    /// `n_parameters` is the count of estimated parameters k, including any
    /// residual/dispersion parameter the family estimates; it feeds the
    /// information-criterion penalty directly.
    pub fn new(
        coefficients: BTreeMap<String, Coefficient>,
        log_likelihood: f64,
        n_parameters: usize,
        converged: bool,
    ) -> Result<FittedModel> {
        if !log_likelihood.is_finite() {
            return Err(MminferError::InvalidValue(format!(
                "log-likelihood is not finite: {}",
                log_likelihood
            )));
        }
        if n_parameters == 0 {
            return Err(MminferError::InvalidValue(
                "fitted model reports zero estimated parameters".to_string(),
            ));
        }
        Ok(FittedModel {
            coefficients,
            log_likelihood,
            n_parameters,
            converged,
        })
    }

    pub fn coefficient(&self, term_name: &str) -> Option<&Coefficient> {
        self.coefficients.get(term_name)
    }

    /// All coefficients, keyed by term name, in deterministic (sorted) order.
    pub fn coefficients(&self) -> &BTreeMap<String, Coefficient> {
        &self.coefficients
    }

    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// Number of estimated parameters k (degrees of freedom of the fit).
    pub fn n_parameters(&self) -> usize {
        self.n_parameters
    }

    pub fn converged(&self) -> bool {
        self.converged
    }
}

// =============================================================================
// Fitter Trait
// =============================================================================

/// Capability interface for the external fitting engine.
///
/// Contract:
///   - a fit that fails to converge returns
///     [`MminferError::ConvergenceFailure`] (recoverable: the enumerator
///     records it and moves on);
///   - any other error is fatal to the whole pipeline;
///   - fits are independent: the enumerator may call `fit` from multiple
///     threads, so implementations must not mutate shared state.
pub trait ModelFitter {
    fn fit(&self, candidate: &CandidateModel) -> Result<FittedModel>;
}
