// =============================================================================
// Dataset
// =============================================================================
//
// A minimal column-oriented table: named numeric columns of equal length,
// kept in insertion order. This is the read-only view every candidate fit
// shares; nothing in the pipeline mutates it.
//
// MISSING DATA
// ------------
// Model selection over candidates is only meaningful when every candidate
// sees the SAME rows; silently dropping incomplete rows per fit would make
// likelihoods incomparable. Validation therefore fails the whole run when a
// referenced column is absent or contains NaN ("na.fail" semantics), before
// enumeration starts.
//
// Categorical predictors are expected pre-coded as numeric columns; data
// wrangling happens upstream of this library.
//
// =============================================================================

use ndarray::Array1;

use mminfer_core::error::{MminferError, Result};
use mminfer_core::terms::GlobalModel;

/// Column-oriented numeric table.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    names: Vec<String>,
    columns: Vec<Array1<f64>>,
}

impl Dataset {
    pub fn new() -> Dataset {
        Dataset::default()
    }

    /// Append a column. The first column fixes the row count; later columns
    /// must match it, and names must be unique and non-empty.
    pub fn push_column(&mut self, name: impl Into<String>, values: Array1<f64>) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(MminferError::InvalidValue(
                "column name is empty".to_string(),
            ));
        }
        if self.names.iter().any(|n| *n == name) {
            return Err(MminferError::InvalidValue(format!(
                "duplicate column '{}'",
                name
            )));
        }
        if let Some(first) = self.columns.first() {
            if first.len() != values.len() {
                return Err(MminferError::DimensionMismatch(format!(
                    "column '{}' has {} rows but the dataset has {}",
                    name,
                    values.len(),
                    first.len()
                )));
            }
        } else if values.is_empty() {
            return Err(MminferError::EmptyInput(format!(
                "column '{}' has no rows",
                name
            )));
        }
        self.names.push(name);
        self.columns.push(values);
        Ok(())
    }

    /// Builder-style [`push_column`](Dataset::push_column).
    pub fn with_column(mut self, name: impl Into<String>, values: Array1<f64>) -> Result<Dataset> {
        self.push_column(name, values)?;
        Ok(self)
    }

    pub fn column(&self, name: &str) -> Option<&Array1<f64>> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.len())
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Enforce na.fail semantics for everything the global model references:
    /// the response, every variable of every term, and the grouping column
    /// must exist, contain no NaN, and be finite.
    ///
    /// Called before enumeration so a data problem kills the run before the
    /// first fit, with the offending column named.
    pub fn validate_for(&self, global: &GlobalModel) -> Result<()> {
        if self.n_rows() == 0 {
            return Err(MminferError::EmptyInput("dataset has no rows".to_string()));
        }

        let mut required: Vec<&str> = vec![global.response()];
        for term in global.terms() {
            for var in term.variables() {
                if !required.contains(&var) {
                    required.push(var);
                }
            }
        }
        if let Some(group) = global.grouping() {
            if !required.contains(&group) {
                required.push(group);
            }
        }

        for name in required {
            let column = self
                .column(name)
                .ok_or_else(|| MminferError::MissingData(name.to_string()))?;
            if column.iter().any(|v| v.is_nan()) {
                return Err(MminferError::MissingData(name.to_string()));
            }
            if column.iter().any(|v| v.is_infinite()) {
                return Err(MminferError::InvalidValue(format!(
                    "column '{}' contains non-finite values",
                    name
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mminfer_core::terms::Family;
    use ndarray::array;

    fn small_global() -> GlobalModel {
        GlobalModel::builder("y", Family::Gaussian)
            .main("x")
            .grouping("site")
            .build()
            .unwrap()
    }

    #[test]
    fn test_push_and_lookup() {
        let data = Dataset::new()
            .with_column("y", array![1.0, 2.0, 3.0])
            .unwrap()
            .with_column("x", array![0.1, 0.2, 0.3])
            .unwrap();
        assert_eq!(data.n_rows(), 3);
        assert_eq!(data.n_columns(), 2);
        assert_eq!(data.column("x").unwrap()[1], 0.2);
        assert!(data.column("z").is_none());
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let result = Dataset::new()
            .with_column("y", array![1.0, 2.0])
            .unwrap()
            .with_column("x", array![1.0]);
        assert!(matches!(result, Err(MminferError::DimensionMismatch(_))));
    }

    #[test]
    fn test_rejects_duplicate_name() {
        let result = Dataset::new()
            .with_column("y", array![1.0])
            .unwrap()
            .with_column("y", array![2.0]);
        assert!(matches!(result, Err(MminferError::InvalidValue(_))));
    }

    #[test]
    fn test_validate_passes_on_complete_data() {
        let data = Dataset::new()
            .with_column("y", array![1.0, 2.0])
            .unwrap()
            .with_column("x", array![0.5, 0.7])
            .unwrap()
            .with_column("site", array![1.0, 2.0])
            .unwrap();
        assert!(data.validate_for(&small_global()).is_ok());
    }

    #[test]
    fn test_validate_names_missing_column() {
        let data = Dataset::new().with_column("y", array![1.0, 2.0]).unwrap();
        let err = data.validate_for(&small_global()).unwrap_err();
        assert!(matches!(err, MminferError::MissingData(ref c) if c == "x"));
    }

    #[test]
    fn test_validate_fails_on_nan() {
        let data = Dataset::new()
            .with_column("y", array![1.0, 2.0])
            .unwrap()
            .with_column("x", array![0.5, f64::NAN])
            .unwrap()
            .with_column("site", array![1.0, 2.0])
            .unwrap();
        let err = data.validate_for(&small_global()).unwrap_err();
        assert!(matches!(err, MminferError::MissingData(ref c) if c == "x"));
    }
}
