// =============================================================================
// Information Criteria
// =============================================================================
//
// Criteria trade goodness of fit (log-likelihood) against model complexity
// (parameter count):
//
//     AIC  = 2k - 2*logLik
//     AICc = AIC + 2k(k+1) / (n - k - 1)     (small-sample correction)
//     BIC  = k*ln(n) - 2*logLik
//
// Lower is better for all three.
//
// EFFECTIVE SAMPLE SIZE
// ---------------------
// AICc and BIC need n. For independent observations n is just the row count,
// but for grouped/hierarchical data the right n is genuinely disputed: the
// number of level-1 observations, the number of groups, or something in
// between. The convention here is the number of level-1 observations, and n
// is always an EXPLICIT caller-supplied parameter, never inferred, so that
// a disputed default cannot silently leak into results.
//
// AKAIKE WEIGHTS
// --------------
// Within one ranked set, a model's delta is its criterion value minus the
// best value; its weight is exp(-delta/2) normalized so the set sums to 1.
// Weights are relative likelihoods: they only mean something with respect to
// the full set they were normalized over.
//
// =============================================================================

use crate::error::{MminferError, Result};

/// Which information criterion to rank candidates by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    Aic,
    /// AIC with the small-sample correction. The usual default for the
    /// modest sample sizes of ecological field data.
    Aicc,
    Bic,
}

impl Criterion {
    pub fn name(&self) -> &'static str {
        match self {
            Criterion::Aic => "AIC",
            Criterion::Aicc => "AICc",
            Criterion::Bic => "BIC",
        }
    }

    /// Evaluate the criterion for one fitted model.
    ///
    /// # Arguments
    /// * `log_likelihood` - maximized log-likelihood of the fit
    /// * `n_parameters` - number of estimated parameters k, including any
    ///   dispersion parameter the family estimates
    /// * `sample_size` - effective sample size n (see module notes; by
    ///   convention the number of level-1 observations)
    ///
    /// # Errors
    /// `InsufficientSampleSize` when AICc's denominator n - k - 1 is zero or
    /// negative; `InvalidValue` for non-finite inputs or n <= 0.
    pub fn evaluate(&self, log_likelihood: f64, n_parameters: usize, sample_size: f64) -> Result<f64> {
        if !log_likelihood.is_finite() {
            return Err(MminferError::InvalidValue(format!(
                "log-likelihood is not finite: {}",
                log_likelihood
            )));
        }
        if !sample_size.is_finite() || sample_size <= 0.0 {
            return Err(MminferError::InvalidValue(format!(
                "effective sample size must be positive, got {}",
                sample_size
            )));
        }

        let k = n_parameters as f64;
        let aic = 2.0 * k - 2.0 * log_likelihood;

        match self {
            Criterion::Aic => Ok(aic),
            Criterion::Aicc => {
                let denom = sample_size - k - 1.0;
                if denom <= 0.0 {
                    return Err(MminferError::InsufficientSampleSize {
                        n: sample_size,
                        k: n_parameters,
                    });
                }
                Ok(aic + (2.0 * k * (k + 1.0)) / denom)
            }
            Criterion::Bic => Ok(k * sample_size.ln() - 2.0 * log_likelihood),
        }
    }
}

// =============================================================================
// Deltas and Weights
// =============================================================================

/// Criterion deltas against the best (smallest) value in the set.
///
/// The best model's delta is exactly 0.
pub fn deltas(values: &[f64]) -> Vec<f64> {
    let best = values.iter().copied().fold(f64::INFINITY, f64::min);
    values.iter().map(|v| v - best).collect()
}

/// Akaike weights from deltas: exp(-delta/2), normalized to sum to 1.
///
/// Computed from deltas rather than raw criterion values so large
/// likelihoods cannot underflow the exponentials for the good models.
pub fn akaike_weights(deltas: &[f64]) -> Vec<f64> {
    let raw: Vec<f64> = deltas.iter().map(|d| (-d / 2.0).exp()).collect();
    let total: f64 = raw.iter().sum();
    raw.iter().map(|r| r / total).collect()
}

// =============================================================================
// Tests
// =============================================================================
