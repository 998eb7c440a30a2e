// =============================================================================
// Family Mathematics
// =============================================================================
//
// The core crate carries `Family` as a tag; this module supplies the actual
// mathematics for each tag, always through the canonical link:
//
//             link        variance V(mu)   response
//   Gaussian  identity    1                continuous
//   Poisson   log         mu               counts
//   Binomial  logit       mu(1-mu)         0/1
//
// The solver needs the link, its derivative, the variance function, the
// unit deviance, and a valid-range clamp; the criteria need the maximized
// log-likelihood and the parameter count convention (Gaussian estimates a
// dispersion, so its k includes one extra parameter).
//
// =============================================================================

use ndarray::Array1;
use statrs::function::gamma::ln_gamma;

use mminfer_core::terms::Family;

/// Numerical floor keeping mu strictly inside the family's valid range.
const MU_EPS: f64 = 1e-10;

/// Family-specific operations used by the bundled GLM fitter.
///
/// Implemented on the core `Family` tag so callers describe the model once
/// and both crates agree on what the tag means.
pub trait FamilyOps {
    /// Link function eta = g(mu).
    fn link(&self, mu: f64) -> f64;
    /// Inverse link mu = g^-1(eta).
    fn inverse_link(&self, eta: f64) -> f64;
    /// Link derivative d eta / d mu.
    fn link_derivative(&self, mu: f64) -> f64;
    /// Variance function V(mu).
    fn variance(&self, mu: f64) -> f64;
    /// Contribution of one observation to the deviance.
    fn unit_deviance(&self, y: f64, mu: f64) -> f64;
    /// Clamp mu into the family's valid open range.
    fn clamp_mu(&self, mu: f64) -> f64;
    /// Maximized log-likelihood of the fit (dispersion profiled out where
    /// the family has one).
    fn log_likelihood(&self, y: &Array1<f64>, mu: &Array1<f64>) -> f64;
    /// Number of parameters beyond the regression coefficients (1 for the
    /// Gaussian dispersion, 0 otherwise). Feeds the criterion's k.
    fn n_dispersion_parameters(&self) -> usize;
}

impl FamilyOps for Family {
    fn link(&self, mu: f64) -> f64 {
        match self {
            Family::Gaussian => mu,
            Family::Poisson => mu.ln(),
            Family::Binomial => (mu / (1.0 - mu)).ln(),
        }
    }

    fn inverse_link(&self, eta: f64) -> f64 {
        match self {
            Family::Gaussian => eta,
            Family::Poisson => eta.exp(),
            Family::Binomial => 1.0 / (1.0 + (-eta).exp()),
        }
    }

    fn link_derivative(&self, mu: f64) -> f64 {
        match self {
            Family::Gaussian => 1.0,
            Family::Poisson => 1.0 / mu,
            Family::Binomial => 1.0 / (mu * (1.0 - mu)),
        }
    }

    fn variance(&self, mu: f64) -> f64 {
        match self {
            Family::Gaussian => 1.0,
            Family::Poisson => mu,
            Family::Binomial => mu * (1.0 - mu),
        }
    }

    fn unit_deviance(&self, y: f64, mu: f64) -> f64 {
        match self {
            Family::Gaussian => (y - mu).powi(2),
            Family::Poisson => {
                // y*ln(y/mu) with the 0*ln(0) = 0 convention.
                let term = if y > 0.0 { y * (y / mu).ln() } else { 0.0 };
                2.0 * (term - (y - mu))
            }
            Family::Binomial => {
                let a = if y > 0.0 { y * (y / mu).ln() } else { 0.0 };
                let b = if y < 1.0 {
                    (1.0 - y) * ((1.0 - y) / (1.0 - mu)).ln()
                } else {
                    0.0
                };
                2.0 * (a + b)
            }
        }
    }

    fn clamp_mu(&self, mu: f64) -> f64 {
        match self {
            Family::Gaussian => mu,
            Family::Poisson => mu.max(MU_EPS),
            Family::Binomial => mu.max(MU_EPS).min(1.0 - MU_EPS),
        }
    }

    fn log_likelihood(&self, y: &Array1<f64>, mu: &Array1<f64>) -> f64 {
        let n = y.len() as f64;
        match self {
            Family::Gaussian => {
                // Dispersion at its maximum-likelihood value RSS/n, which is
                // what keeps AIC comparisons across Gaussian fits coherent.
                let rss: f64 = y
                    .iter()
                    .zip(mu.iter())
                    .map(|(&yi, &mi)| (yi - mi).powi(2))
                    .sum();
                -0.5 * n * ((2.0 * std::f64::consts::PI * rss / n).ln() + 1.0)
            }
            Family::Poisson => y
                .iter()
                .zip(mu.iter())
                .map(|(&yi, &mi)| yi * mi.ln() - mi - ln_gamma(yi + 1.0))
                .sum(),
            Family::Binomial => y
                .iter()
                .zip(mu.iter())
                .map(|(&yi, &mi)| yi * mi.ln() + (1.0 - yi) * (1.0 - mi).ln())
                .sum(),
        }
    }

    fn n_dispersion_parameters(&self) -> usize {
        match self {
            Family::Gaussian => 1,
            Family::Poisson | Family::Binomial => 0,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
