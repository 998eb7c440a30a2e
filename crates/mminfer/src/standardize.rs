// =============================================================================
// Predictor Standardization
// =============================================================================
//
// Coefficients are only comparable across predictors (and importance
// weights only meaningful) when the predictors share a scale. This module
// centers and scales every main-effect variable of the global model to mean
// 0 and standard deviation 1, as an explicit, pure transform:
//
//     raw dataset  ->  (standardized dataset, Standardization record)
//
// Nothing is mutated in place; the record holds each variable's (mean,
// scale) and is the single source of truth for mapping results back to the
// raw scale. The response and the grouping column pass through untouched.
//
// BACK-TRANSFORMATION CAVEAT
// --------------------------
// Dividing a slope by its variable's scale recovers the raw-scale slope
// exactly for main effects in a main-effects model. In models with
// interactions, centering also SHIFTS the lower-order coefficients (a main
// effect becomes the slope at the means of its interaction partners), so
// `raw_scale_estimate` undoes the scaling but not the centering shift;
// that re-interpretation is the analyst's job.
//
// =============================================================================

use ndarray::Array1;

use mminfer_core::error::{MminferError, Result};
use mminfer_core::terms::{GlobalModel, Term};

use crate::dataset::Dataset;

/// The (mean, scale) pair recorded for one standardized variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableScale {
    pub name: String,
    pub mean: f64,
    pub scale: f64,
}

/// Reversible record of a standardization pass.
#[derive(Debug, Clone)]
pub struct Standardization {
    records: Vec<VariableScale>,
}

impl Standardization {
    pub fn record(&self, name: &str) -> Option<&VariableScale> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn records(&self) -> &[VariableScale] {
        &self.records
    }

    /// Map a standardized-scale estimate for `term` back to the raw scale.
    ///
    /// A main effect divides by its variable's scale; an interaction divides
    /// by the product of its components' scales. Works for standard errors
    /// too (scaling is linear).
    pub fn raw_scale_estimate(&self, term: &Term, standardized: f64) -> Result<f64> {
        let mut divisor = 1.0;
        for var in term.variables() {
            let record = self.record(var).ok_or_else(|| {
                MminferError::InvalidValue(format!("variable '{}' was not standardized", var))
            })?;
            divisor *= record.scale;
        }
        Ok(standardized / divisor)
    }
}

/// Standardize every main-effect variable referenced by the global model.
///
/// Fails with `InvalidValue` on a constant column (scale 0 would divide the
/// data away) and with `MissingData` when a referenced column is absent.
pub fn standardize(data: &Dataset, global: &GlobalModel) -> Result<(Dataset, Standardization)> {
    // Unique main-effect variables, in first-reference order.
    let mut variables: Vec<&str> = Vec::new();
    for term in global.terms() {
        for var in term.variables() {
            if !variables.contains(&var) {
                variables.push(var);
            }
        }
    }

    let mut records = Vec::with_capacity(variables.len());
    let mut out = Dataset::new();

    for name in data.names() {
        let column = data.column(name).cloned().ok_or_else(|| {
            // Unreachable: names() and columns are kept in lockstep.
            MminferError::MissingData(name.clone())
        })?;
        if variables.contains(&name.as_str()) {
            let (standardized, record) = standardize_column(name, &column)?;
            records.push(record);
            out.push_column(name.clone(), standardized)?;
        } else {
            out.push_column(name.clone(), column)?;
        }
    }

    // Every referenced variable must actually be in the dataset.
    for var in variables {
        if out.column(var).is_none() {
            return Err(MminferError::MissingData(var.to_string()));
        }
    }

    Ok((out, Standardization { records }))
}

fn standardize_column(name: &str, column: &Array1<f64>) -> Result<(Array1<f64>, VariableScale)> {
    let n = column.len() as f64;
    let mean = column.sum() / n;
    let variance = column.mapv(|v| (v - mean).powi(2)).sum() / (n - 1.0).max(1.0);
    let scale = variance.sqrt();
    if scale == 0.0 || !scale.is_finite() {
        return Err(MminferError::InvalidValue(format!(
            "column '{}' is constant; cannot standardize",
            name
        )));
    }
    Ok((
        column.mapv(|v| (v - mean) / scale),
        VariableScale {
            name: name.to_string(),
            mean,
            scale,
        },
    ))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mminfer_core::terms::Family;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn setup() -> (Dataset, GlobalModel) {
        let data = Dataset::new()
            .with_column("y", array![1.0, 2.0, 3.0, 4.0])
            .unwrap()
            .with_column("a", array![2.0, 4.0, 6.0, 8.0])
            .unwrap()
            .with_column("b", array![1.0, 1.0, 2.0, 2.0])
            .unwrap();
        let global = GlobalModel::builder("y", Family::Gaussian)
            .main("a")
            .main("b")
            .interaction(["a", "b"])
            .build()
            .unwrap();
        (data, global)
    }

    #[test]
    fn test_standardized_columns_have_zero_mean_unit_sd() {
        let (data, global) = setup();
        let (out, record) = standardize(&data, &global).unwrap();

        for var in ["a", "b"] {
            let column = out.column(var).unwrap();
            let mean = column.sum() / column.len() as f64;
            assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-12);
            let sd = (column.mapv(|v| (v - mean).powi(2)).sum() / 3.0).sqrt();
            assert_abs_diff_eq!(sd, 1.0, epsilon = 1e-12);
            assert!(record.record(var).is_some());
        }

        // Response passes through untouched; original dataset unchanged.
        assert_eq!(out.column("y").unwrap(), data.column("y").unwrap());
        assert_abs_diff_eq!(data.column("a").unwrap()[0], 2.0, epsilon = 1e-15);
    }

    #[test]
    fn test_record_holds_mean_and_scale() {
        let (data, global) = setup();
        let (_, record) = standardize(&data, &global).unwrap();
        let a = record.record("a").unwrap();
        assert_abs_diff_eq!(a.mean, 5.0, epsilon = 1e-12);
        // Sample SD of [2, 4, 6, 8].
        assert_abs_diff_eq!(a.scale, (20.0_f64 / 3.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_raw_scale_inversion() {
        let (data, global) = setup();
        let (_, record) = standardize(&data, &global).unwrap();

        let a_scale = record.record("a").unwrap().scale;
        let b_scale = record.record("b").unwrap().scale;

        let main = Term::main("a");
        assert_abs_diff_eq!(
            record.raw_scale_estimate(&main, 1.5).unwrap(),
            1.5 / a_scale,
            epsilon = 1e-12
        );

        let interaction = Term::interaction(["a", "b"]);
        assert_abs_diff_eq!(
            record.raw_scale_estimate(&interaction, 1.5).unwrap(),
            1.5 / (a_scale * b_scale),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_constant_column_is_rejected() {
        let data = Dataset::new()
            .with_column("y", array![1.0, 2.0])
            .unwrap()
            .with_column("a", array![3.0, 3.0])
            .unwrap();
        let global = GlobalModel::builder("y", Family::Gaussian)
            .main("a")
            .build()
            .unwrap();
        let result = standardize(&data, &global);
        assert!(matches!(result, Err(MminferError::InvalidValue(_))));
    }

    #[test]
    fn test_unknown_variable_in_inversion() {
        let (data, global) = setup();
        let (_, record) = standardize(&data, &global).unwrap();
        let result = record.raw_scale_estimate(&Term::main("zzz"), 1.0);
        assert!(matches!(result, Err(MminferError::InvalidValue(_))));
    }
}
