// =============================================================================
// Report Tables
// =============================================================================
//
// Plain-text renderings of the two tables a multi-model analysis reports:
//
//   SELECTION TABLE   one row per top-set model: which terms are in it,
//                     df, log-likelihood, criterion value, delta, weight
//
//   COEFFICIENT TABLE one row per averaged term: full and conditional
//                     estimates, adjusted SE, CI bounds, importance
//
// Both are plain structs with Display; anything fancier (HTML, plots)
// belongs to downstream consumers.
//
// =============================================================================

use std::fmt;

use mminfer_core::average::AveragedCoefficient;
use mminfer_core::select::TopSet;
use mminfer_core::terms::GlobalModel;

// =============================================================================
// Selection Table
// =============================================================================

/// One top-set member in the selection table.
#[derive(Debug, Clone)]
pub struct SelectionRow {
    /// Presence of each global term, aligned with the table's term order.
    pub present: Vec<bool>,
    pub df: usize,
    pub log_likelihood: f64,
    pub criterion_value: f64,
    pub delta: f64,
    /// Akaike weight from the FULL ranking (not renormalized).
    pub weight: f64,
}

/// Model-selection table over a top set.
#[derive(Debug, Clone)]
pub struct SelectionTable {
    pub criterion_name: &'static str,
    pub term_names: Vec<String>,
    pub rows: Vec<SelectionRow>,
}

/// Build the selection table for a top set.
pub fn selection_table(top: &TopSet, global: &GlobalModel) -> SelectionTable {
    let term_names: Vec<String> = global.terms().iter().map(|t| t.name()).collect();
    let rows = top
        .entries()
        .iter()
        .map(|entry| SelectionRow {
            present: term_names
                .iter()
                .map(|name| entry.candidate.contains(name))
                .collect(),
            df: entry.fitted.n_parameters(),
            log_likelihood: entry.fitted.log_likelihood(),
            criterion_value: entry.criterion_value,
            delta: entry.delta,
            weight: entry.weight,
        })
        .collect();
    SelectionTable {
        criterion_name: top.criterion().name(),
        term_names,
        rows,
    }
}

impl fmt::Display for SelectionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for name in &self.term_names {
            write!(f, "{:>width$} ", name, width = name.len().max(4))?;
        }
        writeln!(
            f,
            "{:>4} {:>10} {:>10} {:>7} {:>7}",
            "df", "logLik", self.criterion_name, "delta", "weight"
        )?;
        for row in &self.rows {
            for (name, present) in self.term_names.iter().zip(&row.present) {
                let mark = if *present { "+" } else { "" };
                write!(f, "{:>width$} ", mark, width = name.len().max(4))?;
            }
            writeln!(
                f,
                "{:>4} {:>10.3} {:>10.2} {:>7.2} {:>7.3}",
                row.df, row.log_likelihood, row.criterion_value, row.delta, row.weight
            )?;
        }
        Ok(())
    }
}

// =============================================================================
// Coefficient Table
// =============================================================================

/// Averaged-coefficients table.
#[derive(Debug, Clone)]
pub struct CoefficientTable {
    pub confidence_level: f64,
    pub rows: Vec<AveragedCoefficient>,
}

pub fn coefficient_table(
    averaged: &[AveragedCoefficient],
    confidence_level: f64,
) -> CoefficientTable {
    CoefficientTable {
        confidence_level,
        rows: averaged.to_vec(),
    }
}

impl fmt::Display for CoefficientTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .rows
            .iter()
            .map(|r| r.term.len())
            .max()
            .unwrap_or(4)
            .max(4);
        let pct = self.confidence_level * 100.0;
        writeln!(
            f,
            "{:>width$} {:>10} {:>10} {:>10} {:>10} {:>10} {:>6}",
            "term",
            "full",
            "cond",
            "adj.SE",
            format!("{:.0}%lo", pct),
            format!("{:.0}%hi", pct),
            "imp",
            width = width
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "{:>width$} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>6.3}",
                row.term,
                row.full_estimate,
                row.conditional_estimate,
                row.full_std_error,
                row.full_ci.0,
                row.full_ci.1,
                row.importance,
                width = width
            )?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
