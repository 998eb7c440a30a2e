// =============================================================================
// Bundled GLM Fitter (IRLS)
// =============================================================================
//
// A fixed-effects GLM backend for the core's `ModelFitter` capability, so
// the selection pipeline works out of the box. Fitting is IRLS:
//
//     Start from an initial guess for mu
//     Repeat:
//         1. Working weights  w = 1 / (V(mu) * g'(mu)^2)
//         2. Working response z = eta + (y - mu) * g'(mu)
//         3. Solve weighted least squares (X'WX) beta = X'Wz
//         4. Update eta = X beta, mu = g^-1(eta)
//         5. Stop when the relative deviance change is below tolerance
//
// Observations with higher variance get less weight; that is how GLMs
// absorb heteroscedasticity without any explicit modelling of it.
//
// SCOPE
// -----
// The global model's grouping variable is carried through the candidate
// specifications but NOT used here: this backend fits fixed effects only.
// A hierarchical (mixed-model) engine plugs into the same `ModelFitter`
// trait; the selection machinery never knows the difference.
//
// A fit that runs out of iterations reports ConvergenceFailure, which the
// enumerator records and survives. A singular system (collinear candidate
// columns) is a LinearAlgebra error and aborts the run.
//
// =============================================================================

use std::collections::BTreeMap;

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

use mminfer_core::error::{MminferError, Result};
use mminfer_core::fitter::{Coefficient, FittedModel, ModelFitter};
use mminfer_core::terms::{CandidateModel, GlobalModel};

use crate::dataset::Dataset;
use crate::design::design_matrix;
use crate::families::FamilyOps;

// =============================================================================
// Configuration
// =============================================================================

/// IRLS options. The defaults converge for well-behaved problems.
#[derive(Debug, Clone)]
pub struct GlmConfig {
    /// Maximum IRLS iterations before reporting non-convergence.
    /// Default: 25.
    pub max_iterations: usize,

    /// Stop when |dev_new - dev_old| / |dev_old| falls below this.
    /// Default: 1e-8.
    pub tolerance: f64,

    /// Floor (and implied ceiling 1e10) for working weights, to keep the
    /// weighted system numerically sane. Default: 1e-10.
    pub min_weight: f64,

    /// Print per-iteration deviance to stderr. Default: false.
    pub verbose: bool,
}

impl Default for GlmConfig {
    fn default() -> Self {
        GlmConfig {
            max_iterations: 25,
            tolerance: 1e-8,
            min_weight: 1e-10,
            verbose: false,
        }
    }
}

// =============================================================================
// Fitter
// =============================================================================

/// Fixed-effects GLM fitter over one dataset and one global model.
///
/// Construction validates the dataset against the global model (na.fail),
/// so a data problem surfaces before enumeration rather than inside the
/// 2^T fit loop. The fitter borrows its inputs immutably and keeps no
/// mutable state, so candidate fits may run in parallel.
pub struct GlmFitter<'a> {
    data: &'a Dataset,
    global: &'a GlobalModel,
    config: GlmConfig,
}

impl<'a> GlmFitter<'a> {
    pub fn new(data: &'a Dataset, global: &'a GlobalModel, config: GlmConfig) -> Result<GlmFitter<'a>> {
        data.validate_for(global)?;
        Ok(GlmFitter {
            data,
            global,
            config,
        })
    }

    /// Predict the response at one covariate point, on the RESPONSE scale.
    ///
    /// `point` maps each main-effect variable to its value; interaction
    /// values are the products of their components. Response-scale output
    /// is what model-averaged prediction needs: each model inverts its own
    /// link before the weighted average is taken.
    pub fn predict(
        &self,
        candidate: &CandidateModel,
        fitted: &FittedModel,
        point: &BTreeMap<String, f64>,
    ) -> Result<f64> {
        let family = self.global.family();
        let intercept = fitted
            .coefficient(mminfer_core::terms::INTERCEPT)
            .ok_or_else(|| {
                MminferError::InvalidValue("fitted model has no intercept".to_string())
            })?;

        let mut eta = intercept.estimate;
        for term in candidate.terms() {
            let coef = fitted.coefficient(&term.name()).ok_or_else(|| {
                MminferError::InvalidValue(format!(
                    "fitted model has no coefficient for '{}'",
                    term.name()
                ))
            })?;
            let mut value = 1.0;
            for var in term.variables() {
                value *= *point
                    .get(var)
                    .ok_or_else(|| MminferError::MissingData(var.to_string()))?;
            }
            eta += coef.estimate * value;
        }
        Ok(family.inverse_link(eta))
    }

    fn fit_candidate(&self, candidate: &CandidateModel) -> Result<FittedModel> {
        let family = self.global.family();
        let y = self
            .data
            .column(self.global.response())
            .cloned()
            .ok_or_else(|| MminferError::MissingData(self.global.response().to_string()))?;
        let (x, names) = design_matrix(self.data, candidate)?;
        let n = y.len();
        let p = x.ncols();

        // ---------------------------------------------------------------------
        // Initialize mu near the data but away from range boundaries, then
        // the linear predictor through the link.
        // ---------------------------------------------------------------------
        let y_mean = y.mean().unwrap_or(1.0);
        let mut mu: Array1<f64> = y.mapv(|yi| family.clamp_mu((yi + y_mean) / 2.0));
        let mut eta: Array1<f64> = mu.mapv(|m| family.link(m));

        let mut deviance: f64 = y
            .iter()
            .zip(mu.iter())
            .map(|(&yi, &mi)| family.unit_deviance(yi, mi))
            .sum();

        let mut converged = false;
        let mut coefficients = Array1::zeros(p);
        let mut covariance = Array2::zeros((p, p));

        for iteration in 1..=self.config.max_iterations {
            // -----------------------------------------------------------------
            // Working weights and working response.
            // -----------------------------------------------------------------
            let weights: Array1<f64> = mu.mapv(|m| {
                let w = 1.0 / (family.variance(m) * family.link_derivative(m).powi(2));
                w.max(self.config.min_weight).min(1e10)
            });
            let z: Array1<f64> = eta
                .iter()
                .zip(y.iter())
                .zip(mu.iter())
                .map(|((&e, &yi), &mi)| e + (yi - mi) * family.link_derivative(mi))
                .collect();

            // -----------------------------------------------------------------
            // Weighted least squares: (X'WX) beta = X'Wz.
            // -----------------------------------------------------------------
            let (beta, cov) = solve_weighted_least_squares(&x, &z, &weights)?;

            eta = x.dot(&beta);
            mu = eta.mapv(|e| family.clamp_mu(family.inverse_link(e)));

            let deviance_old = deviance;
            deviance = y
                .iter()
                .zip(mu.iter())
                .map(|(&yi, &mi)| family.unit_deviance(yi, mi))
                .sum();

            coefficients = beta;
            covariance = cov;

            let rel_change = if deviance_old.abs() > 1e-10 {
                (deviance_old - deviance).abs() / deviance_old.abs()
            } else {
                (deviance_old - deviance).abs()
            };
            if self.config.verbose {
                eprintln!(
                    "candidate {} iteration {}: deviance = {:.6}, rel_change = {:.2e}",
                    candidate.index(),
                    iteration,
                    deviance,
                    rel_change
                );
            }
            if rel_change < self.config.tolerance {
                converged = true;
                break;
            }
        }

        if !converged {
            return Err(MminferError::ConvergenceFailure {
                candidate: candidate.index(),
                detail: format!(
                    "IRLS did not converge in {} iterations (deviance {:.6})",
                    self.config.max_iterations, deviance
                ),
            });
        }

        // ---------------------------------------------------------------------
        // Standard errors: sqrt(phi * diag((X'WX)^-1)), with phi estimated
        // from the deviance for the Gaussian family and fixed at 1 for the
        // one-parameter families.
        // ---------------------------------------------------------------------
        let phi = match family.n_dispersion_parameters() {
            0 => 1.0,
            _ => {
                let df = n.saturating_sub(p) as f64;
                if df > 0.0 {
                    deviance / df
                } else {
                    1.0
                }
            }
        };

        let mut coefs = BTreeMap::new();
        for (j, name) in names.iter().enumerate() {
            coefs.insert(
                name.clone(),
                Coefficient {
                    estimate: coefficients[j],
                    std_error: (phi * covariance[[j, j]]).sqrt(),
                },
            );
        }

        let log_likelihood = family.log_likelihood(&y, &mu);
        let k = p + family.n_dispersion_parameters();
        FittedModel::new(coefs, log_likelihood, k, true)
    }
}

impl ModelFitter for GlmFitter<'_> {
    fn fit(&self, candidate: &CandidateModel) -> Result<FittedModel> {
        self.fit_candidate(candidate)
    }
}

// =============================================================================
// Weighted Least Squares
// =============================================================================

/// Solve min_beta sum_i w_i (z_i - x_i' beta)^2.
///
/// Returns the coefficients and (X'WX)^-1 for standard errors. Scales rows
/// by sqrt(w) instead of forming the diagonal weight matrix, solves by
/// Cholesky with an LU fallback.
fn solve_weighted_least_squares(
    x: &Array2<f64>,
    z: &Array1<f64>,
    w: &Array1<f64>,
) -> Result<(Array1<f64>, Array2<f64>)> {
    let n = x.nrows();
    let p = x.ncols();

    let mut x_weighted = DMatrix::zeros(n, p);
    for i in 0..n {
        let sw = w[i].sqrt();
        for j in 0..p {
            x_weighted[(i, j)] = x[[i, j]] * sw;
        }
    }
    let z_weighted =
        DVector::from_iterator(n, z.iter().zip(w.iter()).map(|(&zi, &wi)| zi * wi.sqrt()));

    let xtx = x_weighted.transpose() * &x_weighted;
    let xtz = x_weighted.transpose() * z_weighted;

    let (beta, inverse) = match xtx.clone().cholesky() {
        Some(chol) => {
            let beta = chol.solve(&xtz);
            let inverse = chol.solve(&DMatrix::identity(p, p));
            (beta, inverse)
        }
        None => {
            let beta = xtx.clone().lu().solve(&xtz).ok_or_else(|| {
                MminferError::LinearAlgebra(
                    "weighted least squares system is singular; the candidate's \
                     columns are likely collinear"
                        .to_string(),
                )
            })?;
            let inverse = xtx.try_inverse().ok_or_else(|| {
                MminferError::LinearAlgebra(
                    "X'WX is not invertible; standard errors are undefined".to_string(),
                )
            })?;
            (beta, inverse)
        }
    };

    let beta_out: Array1<f64> = beta.iter().copied().collect();
    let mut cov_out = Array2::zeros((p, p));
    for i in 0..p {
        for j in 0..p {
            cov_out[[i, j]] = inverse[(i, j)];
        }
    }
    Ok((beta_out, cov_out))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mminfer_core::dredge::{enumerate_candidates, DredgeConfig};
    use mminfer_core::terms::Family;
    use mminfer_core::Criterion;
    use ndarray::array;

    fn gaussian_setup() -> (Dataset, GlobalModel) {
        // y is roughly 2 + 3x.
        let data = Dataset::new()
            .with_column("y", array![5.1, 7.9, 11.2, 13.8, 17.1])
            .unwrap()
            .with_column("x", array![1.0, 2.0, 3.0, 4.0, 5.0])
            .unwrap();
        let global = GlobalModel::builder("y", Family::Gaussian)
            .main("x")
            .build()
            .unwrap();
        (data, global)
    }

    fn candidate_with_mask(global: &GlobalModel, mask: u64) -> CandidateModel {
        enumerate_candidates(global, &DredgeConfig::new(Criterion::Aic, 5.0))
            .unwrap()
            .into_iter()
            .find(|c| c.mask() == mask)
            .unwrap()
    }

    #[test]
    fn test_gaussian_identity_recovers_slope() {
        let (data, global) = gaussian_setup();
        let fitter = GlmFitter::new(&data, &global, GlmConfig::default()).unwrap();
        let candidate = candidate_with_mask(&global, 0b1);
        let fitted = fitter.fit(&candidate).unwrap();

        let intercept = fitted.coefficient("(Intercept)").unwrap().estimate;
        let slope = fitted.coefficient("x").unwrap().estimate;
        assert!((intercept - 2.0).abs() < 0.5);
        assert!((slope - 3.0).abs() < 0.2);
        assert!(fitted.converged());
        // p = 2 coefficients plus the Gaussian dispersion.
        assert_eq!(fitted.n_parameters(), 3);
        assert!(fitted.log_likelihood().is_finite());
    }

    #[test]
    fn test_poisson_log_fit() {
        let data = Dataset::new()
            .with_column("y", array![2.0, 2.0, 3.0, 4.0, 5.0, 7.0])
            .unwrap()
            .with_column("x", array![0.0, 1.0, 2.0, 3.0, 4.0, 5.0])
            .unwrap();
        let global = GlobalModel::builder("y", Family::Poisson)
            .main("x")
            .build()
            .unwrap();
        let fitter = GlmFitter::new(&data, &global, GlmConfig::default()).unwrap();
        let candidate = candidate_with_mask(&global, 0b1);
        let fitted = fitter.fit(&candidate).unwrap();

        // Counts rise with x, so the slope is positive on the log scale.
        assert!(fitted.coefficient("x").unwrap().estimate > 0.0);
        assert_eq!(fitted.n_parameters(), 2);
    }

    #[test]
    fn test_non_convergence_is_recoverable_error() {
        let (data, global) = gaussian_setup();
        let config = GlmConfig {
            max_iterations: 1,
            ..GlmConfig::default()
        };
        let fitter = GlmFitter::new(&data, &global, config).unwrap();
        let candidate = candidate_with_mask(&global, 0b1);
        let result = fitter.fit(&candidate);
        assert!(matches!(
            result,
            Err(MminferError::ConvergenceFailure { .. })
        ));
    }

    #[test]
    fn test_constructor_enforces_na_fail() {
        let data = Dataset::new()
            .with_column("y", array![1.0, f64::NAN])
            .unwrap()
            .with_column("x", array![1.0, 2.0])
            .unwrap();
        let global = GlobalModel::builder("y", Family::Gaussian)
            .main("x")
            .build()
            .unwrap();
        let result = GlmFitter::new(&data, &global, GlmConfig::default());
        assert!(matches!(result, Err(MminferError::MissingData(_))));
    }

    #[test]
    fn test_predict_matches_manual_linear_predictor() {
        let (data, global) = gaussian_setup();
        let fitter = GlmFitter::new(&data, &global, GlmConfig::default()).unwrap();
        let candidate = candidate_with_mask(&global, 0b1);
        let fitted = fitter.fit(&candidate).unwrap();

        let mut point = BTreeMap::new();
        point.insert("x".to_string(), 3.0);
        let prediction = fitter.predict(&candidate, &fitted, &point).unwrap();

        let b0 = fitted.coefficient("(Intercept)").unwrap().estimate;
        let b1 = fitted.coefficient("x").unwrap().estimate;
        assert!((prediction - (b0 + 3.0 * b1)).abs() < 1e-10);
    }

    #[test]
    fn test_predict_requires_point_values() {
        let (data, global) = gaussian_setup();
        let fitter = GlmFitter::new(&data, &global, GlmConfig::default()).unwrap();
        let candidate = candidate_with_mask(&global, 0b1);
        let fitted = fitter.fit(&candidate).unwrap();

        let result = fitter.predict(&candidate, &fitted, &BTreeMap::new());
        assert!(matches!(result, Err(MminferError::MissingData(_))));
    }
}
