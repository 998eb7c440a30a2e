// =============================================================================
// Top-Set Selection
// =============================================================================
//
// A ranking contains every converged candidate; inference rarely wants all
// of them. The usual practice keeps the models with "substantial empirical
// support": those within a small criterion gap of the best model (delta <= 2
// is the folklore default, delta <= 6 a liberal one).
//
// Deltas and Akaike weights were computed over the FULL ranked set; the
// weight denominator must not shrink when the set is filtered. The top set
// therefore keeps each entry's original weight, plus a renormalized copy
// (summing to 1 within the top set) that the averager uses.
//
// =============================================================================

use crate::criteria::Criterion;
use crate::dredge::{ModelRanking, RankedEntry};
use crate::error::{MminferError, Result};

/// The models within a delta threshold of the best, in ranking order.
///
/// Non-empty by construction: selection fails rather than return an empty
/// set. The number of retained entries exceeding the number of independent
/// sampling units is a caller-level sanity concern, not enforced here.
#[derive(Debug, Clone)]
pub struct TopSet {
    criterion: Criterion,
    delta_threshold: f64,
    entries: Vec<RankedEntry>,
    weights: Vec<f64>,
}

impl ModelRanking {
    /// Keep every entry with delta <= `delta_threshold`.
    ///
    /// The best model has delta 0, so any non-negative threshold keeps at
    /// least one model; a threshold of exactly 0 keeps only the best.
    ///
    /// # Errors
    /// `EmptySelection` when the threshold is negative or the ranking has
    /// no converged entries to select from.
    pub fn select(&self, delta_threshold: f64) -> Result<TopSet> {
        if !delta_threshold.is_finite() || delta_threshold < 0.0 {
            return Err(MminferError::EmptySelection(format!(
                "delta threshold must be non-negative, got {}",
                delta_threshold
            )));
        }
        if self.is_empty() {
            return Err(MminferError::EmptySelection(format!(
                "ranking holds no converged candidates ({} recorded failures)",
                self.failures().len()
            )));
        }

        let entries: Vec<RankedEntry> = self
            .entries()
            .iter()
            .filter(|e| e.delta <= delta_threshold)
            .cloned()
            .collect();

        // The best entry's delta is exactly 0, so this only triggers if a
        // caller hands in a ranking whose deltas were tampered with.
        if entries.is_empty() {
            return Err(MminferError::EmptySelection(format!(
                "no entry within delta {} of the best model",
                delta_threshold
            )));
        }

        let total: f64 = entries.iter().map(|e| e.weight).sum();
        let weights: Vec<f64> = entries.iter().map(|e| e.weight / total).collect();

        Ok(TopSet {
            criterion: self.criterion(),
            delta_threshold,
            entries,
            weights,
        })
    }
}

impl TopSet {
    pub fn criterion(&self) -> Criterion {
        self.criterion
    }

    pub fn delta_threshold(&self) -> f64 {
        self.delta_threshold
    }

    /// Retained entries, best first. Each keeps the delta and Akaike weight
    /// it had in the full ranking.
    pub fn entries(&self) -> &[RankedEntry] {
        &self.entries
    }

    /// Weights renormalized to sum to 1 within the top set, aligned with
    /// [`entries`](TopSet::entries). These are what averaging uses.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn best(&self) -> &RankedEntry {
        // Invariant: a TopSet is never empty.
        &self.entries[0]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

// =============================================================================
// Tests
// =============================================================================
