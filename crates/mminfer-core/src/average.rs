// =============================================================================
// Model Averaging
// =============================================================================
//
// Instead of betting on one best model, average the coefficient estimates
// across the top set, weighted by (renormalized) Akaike weights. Two
// averaging conventions coexist and both are reported:
//
//   FULL:        average over EVERY top-set model, treating a coefficient as
//                exactly 0 (with zero within-model variance) in models that
//                lack the term. Shrinks weakly supported effects toward 0.
//
//   CONDITIONAL: average only over the models that contain the term, with
//                weights renormalized within that subset. No shrinkage.
//
// UNCONDITIONAL STANDARD ERROR
// ----------------------------
// The variance of an averaged estimate has two sources: the within-model
// sampling variance of each estimate, and the between-model spread of the
// estimates around the average. Per model i:
//
//     var_i = SE_i^2 + (b_i - estimate)^2
//
// and the combined standard error is the WEIGHTED AVERAGE OF SQUARE ROOTS:
//
//     SE = sum_i w_i * sqrt(var_i)
//
// Averaging the variances and square-rooting afterwards is a common but
// WRONG substitute: it is not the same number. The tests pin the correct
// formula against a worked example.
//
// CONFIDENCE INTERVALS
// --------------------
// estimate +/- z * SE with z the standard-normal quantile for the requested
// level. This is the large-sample approximation; no finite-sample or
// profile-based correction is attempted.
//
// =============================================================================

use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::{MminferError, Result};
use crate::select::TopSet;
use crate::terms::INTERCEPT;

// =============================================================================
// Configuration and Output
// =============================================================================

/// Options for the averaging pass.
#[derive(Debug, Clone)]
pub struct AverageConfig {
    /// Confidence level for the intervals, in (0, 1). Default: 0.95.
    pub confidence_level: f64,
}

impl Default for AverageConfig {
    fn default() -> Self {
        AverageConfig {
            confidence_level: 0.95,
        }
    }
}

/// Averaged inference for one term across the top set.
#[derive(Debug, Clone)]
pub struct AveragedCoefficient {
    pub term: String,

    /// Zero-imputed average over every top-set model.
    pub full_estimate: f64,
    /// Average over only the models containing the term.
    pub conditional_estimate: f64,

    /// Unconditional (adjusted) standard errors for each flavor.
    pub full_std_error: f64,
    pub conditional_std_error: f64,

    /// Confidence intervals (lower, upper) for each flavor.
    pub full_ci: (f64, f64),
    pub conditional_ci: (f64, f64),

    /// Relative importance: the sum of renormalized top-set weights of the
    /// models containing the term. 1 when the term is in every model.
    pub importance: f64,

    /// How many top-set models contain the term.
    pub n_models: usize,
}

// =============================================================================
// Averaging
// =============================================================================

impl TopSet {
    /// Average every coefficient that appears in at least one top-set model.
    ///
    /// The intercept is listed first, the remaining terms in sorted name
    /// order. Weights are the top set's renormalized weights (sum 1).
    pub fn average(&self, config: &AverageConfig) -> Result<Vec<AveragedCoefficient>> {
        if !(config.confidence_level > 0.0 && config.confidence_level < 1.0) {
            return Err(MminferError::InvalidValue(format!(
                "confidence level must lie in (0, 1), got {}",
                config.confidence_level
            )));
        }
        let z = normal_quantile(config.confidence_level);
        let weights = self.weights();

        // Terms in deterministic output order: intercept first, then sorted.
        let mut names: Vec<String> = Vec::new();
        for entry in self.entries() {
            for name in entry.fitted.coefficients().keys() {
                if name != INTERCEPT && !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names.sort();
        if self
            .entries()
            .iter()
            .any(|e| e.fitted.coefficient(INTERCEPT).is_some())
        {
            names.insert(0, INTERCEPT.to_string());
        }

        let mut averaged = Vec::with_capacity(names.len());
        for name in names {
            averaged.push(self.average_term(&name, weights, z));
        }
        Ok(averaged)
    }

    fn average_term(&self, name: &str, weights: &[f64], z: f64) -> AveragedCoefficient {
        // (weight, estimate, std_error) for the models containing the term.
        let containing: Vec<(f64, f64, f64)> = self
            .entries()
            .iter()
            .zip(weights)
            .filter_map(|(entry, &w)| {
                entry
                    .fitted
                    .coefficient(name)
                    .map(|c| (w, c.estimate, c.std_error))
            })
            .collect();

        let importance: f64 = containing.iter().map(|(w, _, _)| w).sum();

        // Point estimates. The full average spreads the same weighted sum
        // over all models (absent ones contribute 0); the conditional
        // average renormalizes within the containing subset.
        let weighted_sum: f64 = containing.iter().map(|(w, b, _)| w * b).sum();
        let full_estimate = weighted_sum;
        let conditional_estimate = weighted_sum / importance;

        // Unconditional SEs: weighted average of per-model square roots.
        let full_std_error: f64 = self
            .entries()
            .iter()
            .zip(weights)
            .map(|(entry, &w)| {
                let (b, se) = entry
                    .fitted
                    .coefficient(name)
                    .map(|c| (c.estimate, c.std_error))
                    .unwrap_or((0.0, 0.0));
                w * (se * se + (b - full_estimate).powi(2)).sqrt()
            })
            .sum();

        let conditional_std_error: f64 = containing
            .iter()
            .map(|(w, b, se)| {
                (w / importance) * (se * se + (b - conditional_estimate).powi(2)).sqrt()
            })
            .sum();

        AveragedCoefficient {
            term: name.to_string(),
            full_estimate,
            conditional_estimate,
            full_std_error,
            conditional_std_error,
            full_ci: (
                full_estimate - z * full_std_error,
                full_estimate + z * full_std_error,
            ),
            conditional_ci: (
                conditional_estimate - z * conditional_std_error,
                conditional_estimate + z * conditional_std_error,
            ),
            importance,
            n_models: containing.len(),
        }
    }

    /// Model-averaged prediction at one covariate point.
    ///
    /// `predictions` holds each top-set model's prediction at that point,
    /// aligned with [`entries`](TopSet::entries), ON THE RESPONSE SCALE:
    /// each model applies its inverse link before averaging. Averaging
    /// linear predictors and inverting afterwards is NOT equivalent for
    /// non-identity links and must not be substituted.
    pub fn averaged_prediction(&self, predictions: &[f64]) -> Result<f64> {
        if predictions.len() != self.len() {
            return Err(MminferError::DimensionMismatch(format!(
                "{} predictions supplied for a top set of {} models",
                predictions.len(),
                self.len()
            )));
        }
        Ok(self
            .weights()
            .iter()
            .zip(predictions)
            .map(|(w, p)| w * p)
            .sum())
    }
}

/// Two-sided standard-normal quantile for a confidence level, e.g.
/// 0.95 -> 1.959964.
fn normal_quantile(confidence_level: f64) -> f64 {
    let normal = Normal::new(0.0, 1.0).unwrap();
    let alpha = 1.0 - confidence_level;
    normal.inverse_cdf(1.0 - alpha / 2.0)
}

// =============================================================================
// Tests
// =============================================================================
