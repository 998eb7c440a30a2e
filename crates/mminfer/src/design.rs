// =============================================================================
// Design Matrix Construction
// =============================================================================
//
// Turn a candidate model plus a dataset into the numeric matrix the solver
// consumes: a leading intercept column of ones, one column per included main
// effect, and an elementwise product column per included interaction.
// Column names line up with term names, so coefficients can be mapped back
// without positional bookkeeping.
//
// =============================================================================

use ndarray::{Array1, Array2};

use mminfer_core::error::{MminferError, Result};
use mminfer_core::terms::{CandidateModel, Term, INTERCEPT};

use crate::dataset::Dataset;

/// Build the design matrix for one candidate.
///
/// Returns the n x p matrix and the p column names (intercept first, then
/// the candidate's terms in order).
pub fn design_matrix(
    data: &Dataset,
    candidate: &CandidateModel,
) -> Result<(Array2<f64>, Vec<String>)> {
    let n = data.n_rows();
    if n == 0 {
        return Err(MminferError::EmptyInput("dataset has no rows".to_string()));
    }

    let p = candidate.n_terms() + 1;
    let mut x = Array2::zeros((n, p));
    let mut names = Vec::with_capacity(p);

    x.column_mut(0).fill(1.0);
    names.push(INTERCEPT.to_string());

    for (j, term) in candidate.terms().iter().enumerate() {
        let column = term_column(data, term)?;
        x.column_mut(j + 1).assign(&column);
        names.push(term.name());
    }

    Ok((x, names))
}

/// Evaluate one term over the dataset: the raw column for a main effect,
/// the elementwise product of component columns for an interaction.
pub fn term_column(data: &Dataset, term: &Term) -> Result<Array1<f64>> {
    match term {
        Term::Main(var) => data
            .column(var)
            .cloned()
            .ok_or_else(|| MminferError::MissingData(var.clone())),
        Term::Interaction(parts) => {
            let mut product = Array1::ones(data.n_rows());
            for var in parts {
                let column = data
                    .column(var)
                    .ok_or_else(|| MminferError::MissingData(var.clone()))?;
                product = &product * column;
            }
            Ok(product)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mminfer_core::dredge::{enumerate_candidates, DredgeConfig};
    use mminfer_core::terms::{Family, GlobalModel};
    use mminfer_core::Criterion;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn data() -> Dataset {
        Dataset::new()
            .with_column("y", array![1.0, 2.0, 3.0])
            .unwrap()
            .with_column("a", array![1.0, 0.0, 2.0])
            .unwrap()
            .with_column("b", array![3.0, 4.0, 5.0])
            .unwrap()
    }

    fn full_candidate() -> CandidateModel {
        let global = GlobalModel::builder("y", Family::Gaussian)
            .main("a")
            .main("b")
            .interaction(["a", "b"])
            .build()
            .unwrap();
        enumerate_candidates(&global, &DredgeConfig::new(Criterion::Aic, 3.0))
            .unwrap()
            .into_iter()
            .last()
            .unwrap()
    }

    #[test]
    fn test_full_design_matrix() {
        let (x, names) = design_matrix(&data(), &full_candidate()).unwrap();
        assert_eq!(x.dim(), (3, 4));
        assert_eq!(names, vec!["(Intercept)", "a", "b", "a:b"]);

        // Intercept of ones, raw mains, elementwise product interaction.
        assert_abs_diff_eq!(x[[1, 0]], 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(x[[2, 1]], 2.0, epsilon = 1e-15);
        assert_abs_diff_eq!(x[[0, 3]], 3.0, epsilon = 1e-15); // 1*3
        assert_abs_diff_eq!(x[[1, 3]], 0.0, epsilon = 1e-15); // 0*4
        assert_abs_diff_eq!(x[[2, 3]], 10.0, epsilon = 1e-15); // 2*5
    }

    #[test]
    fn test_missing_column_is_reported() {
        let sparse = Dataset::new().with_column("y", array![1.0, 2.0]).unwrap();
        let result = design_matrix(&sparse, &full_candidate());
        assert!(matches!(result, Err(MminferError::MissingData(_))));
    }
}
