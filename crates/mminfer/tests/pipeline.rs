// =============================================================================
// End-to-End Pipeline Tests
// =============================================================================
//
// A small field-style count analysis run through the whole pipeline:
// enumerate -> fit (bundled Poisson GLM) -> rank by AICc -> select -> average.
//
// The dataset is 24 deterministic observations over a two-level treatment
// and a three-level land-use gradient, four replicates per cell, with
// counts rising under treatment and falling along the gradient.
//
// =============================================================================

use std::collections::BTreeMap;

use approx::assert_abs_diff_eq;
use ndarray::Array1;

use mminfer::{
    dredge, enumerate_candidates, selection_table, standardize, AverageConfig, Criterion, Dataset,
    DredgeConfig, Family, GlmConfig, GlmFitter, GlobalModel, INTERCEPT,
};

fn field_data() -> Dataset {
    let treatment: Vec<f64> = (0..24).map(|i| if i < 12 { 0.0 } else { 1.0 }).collect();
    let landuse: Vec<f64> = (0..24).map(|i| ((i / 4) % 3) as f64 - 1.0).collect();
    let site: Vec<f64> = (0..24).map(|i| (i % 6) as f64 + 1.0).collect();
    // Counts roughly exp(0.8 + 0.5*treatment - 0.3*landuse).
    let count: Vec<f64> = vec![
        3.0, 4.0, 3.0, 2.0, // t=0, l=-1
        2.0, 2.0, 3.0, 2.0, // t=0, l=0
        2.0, 1.0, 2.0, 1.0, // t=0, l=1
        5.0, 6.0, 4.0, 5.0, // t=1, l=-1
        4.0, 3.0, 4.0, 4.0, // t=1, l=0
        3.0, 2.0, 3.0, 3.0, // t=1, l=1
    ];

    Dataset::new()
        .with_column("count", Array1::from_vec(count))
        .unwrap()
        .with_column("treatment", Array1::from_vec(treatment))
        .unwrap()
        .with_column("landuse", Array1::from_vec(landuse))
        .unwrap()
        .with_column("site", Array1::from_vec(site))
        .unwrap()
}

fn field_global() -> GlobalModel {
    GlobalModel::builder("count", Family::Poisson)
        .main("treatment")
        .main("landuse")
        .interaction(["treatment", "landuse"])
        .grouping("site")
        .build()
        .unwrap()
}

fn field_config() -> DredgeConfig {
    DredgeConfig::new(Criterion::Aicc, 24.0)
}

#[test]
fn enumeration_yields_the_five_marginality_valid_models() {
    let candidates = enumerate_candidates(&field_global(), &field_config()).unwrap();

    assert_eq!(candidates.len(), 5);
    let masks: Vec<u64> = candidates.iter().map(|c| c.mask()).collect();
    assert_eq!(masks, vec![0b000, 0b001, 0b010, 0b011, 0b111]);

    // The interaction-only model never appears.
    assert!(candidates
        .iter()
        .all(|c| !(c.contains("landuse:treatment") && !c.contains("treatment"))));
}

#[test]
fn full_pipeline_satisfies_the_weight_invariants() {
    let data = field_data();
    let global = field_global();
    let fitter = GlmFitter::new(&data, &global, GlmConfig::default()).unwrap();

    let ranking = dredge(&global, &fitter, &field_config()).unwrap();

    // Every candidate converges on this well-behaved data.
    assert_eq!(ranking.len(), 5);
    assert!(ranking.failures().is_empty());

    // Full-set Akaike weights sum to 1; the best delta is exactly 0.
    let total: f64 = ranking.entries().iter().map(|e| e.weight).sum();
    assert_abs_diff_eq!(total, 1.0, epsilon = 1e-9);
    assert_eq!(ranking.best().unwrap().delta, 0.0);

    let top = ranking.select(2.0).unwrap();
    assert!(top.len() >= 1);
    assert_eq!(top.best().delta, 0.0);
    let renorm: f64 = top.weights().iter().sum();
    assert_abs_diff_eq!(renorm, 1.0, epsilon = 1e-9);
}

#[test]
fn threshold_zero_reduces_averaging_to_the_best_model() {
    let data = field_data();
    let global = field_global();
    let fitter = GlmFitter::new(&data, &global, GlmConfig::default()).unwrap();
    let ranking = dredge(&global, &fitter, &field_config()).unwrap();

    let top = ranking.select(0.0).unwrap();
    assert_eq!(top.len(), 1);

    let averaged = top.average(&AverageConfig::default()).unwrap();
    let best = &top.best().fitted;
    for row in &averaged {
        let own = best.coefficient(&row.term).unwrap();
        assert_abs_diff_eq!(row.full_estimate, own.estimate, epsilon = 1e-12);
        assert_abs_diff_eq!(row.conditional_estimate, own.estimate, epsilon = 1e-12);
        assert_abs_diff_eq!(row.full_std_error, own.std_error, epsilon = 1e-12);
        assert_abs_diff_eq!(row.importance, 1.0, epsilon = 1e-12);
    }
}

#[test]
fn intercept_importance_is_one_and_estimates_are_ordered() {
    let data = field_data();
    let global = field_global();
    let fitter = GlmFitter::new(&data, &global, GlmConfig::default()).unwrap();
    let ranking = dredge(&global, &fitter, &field_config()).unwrap();
    let top = ranking.select(6.0).unwrap();
    let averaged = top.average(&AverageConfig::default()).unwrap();

    let intercept = averaged.iter().find(|a| a.term == INTERCEPT).unwrap();
    assert_abs_diff_eq!(intercept.importance, 1.0, epsilon = 1e-9);
    // The intercept is in every model, so the two flavors agree.
    assert_abs_diff_eq!(
        intercept.full_estimate,
        intercept.conditional_estimate,
        epsilon = 1e-12
    );

    // Treatment raises counts, land use lowers them; the signal survives
    // averaging.
    let treatment = averaged.iter().find(|a| a.term == "treatment").unwrap();
    assert!(treatment.conditional_estimate > 0.0);
    let landuse = averaged.iter().find(|a| a.term == "landuse").unwrap();
    assert!(landuse.conditional_estimate < 0.0);

    // CI bounds bracket the estimate.
    for row in &averaged {
        assert!(row.full_ci.0 <= row.full_estimate);
        assert!(row.full_estimate <= row.full_ci.1);
    }
}

#[test]
fn rerunning_the_pipeline_is_bit_identical() {
    let data = field_data();
    let global = field_global();
    let config = field_config();

    let run = || {
        let fitter = GlmFitter::new(&data, &global, GlmConfig::default()).unwrap();
        let ranking = dredge(&global, &fitter, &config).unwrap();
        let top = ranking.select(2.0).unwrap();
        let averaged = top.average(&AverageConfig::default()).unwrap();
        (ranking, averaged)
    };

    let (first_ranking, first_avg) = run();
    let (second_ranking, second_avg) = run();

    for (a, b) in first_ranking.entries().iter().zip(second_ranking.entries()) {
        assert_eq!(a.candidate.index(), b.candidate.index());
        assert_eq!(a.criterion_value, b.criterion_value);
        assert_eq!(a.weight, b.weight);
    }
    for (a, b) in first_avg.iter().zip(&second_avg) {
        assert_eq!(a.term, b.term);
        assert_eq!(a.full_estimate, b.full_estimate);
        assert_eq!(a.full_std_error, b.full_std_error);
    }
}

#[test]
fn parallel_fitting_matches_sequential() {
    let data = field_data();
    let global = field_global();
    let fitter = GlmFitter::new(&data, &global, GlmConfig::default()).unwrap();

    let sequential = dredge(&global, &fitter, &field_config()).unwrap();
    let mut par_config = field_config();
    par_config.parallel = true;
    let parallel = dredge(&global, &fitter, &par_config).unwrap();

    assert_eq!(sequential.len(), parallel.len());
    for (a, b) in sequential.entries().iter().zip(parallel.entries()) {
        assert_eq!(a.candidate.mask(), b.candidate.mask());
        assert_eq!(a.criterion_value, b.criterion_value);
    }
}

#[test]
fn model_averaged_prediction_is_on_the_response_scale() {
    let data = field_data();
    let global = field_global();
    let fitter = GlmFitter::new(&data, &global, GlmConfig::default()).unwrap();
    let ranking = dredge(&global, &fitter, &field_config()).unwrap();
    let top = ranking.select(6.0).unwrap();

    let mut point = BTreeMap::new();
    point.insert("treatment".to_string(), 1.0);
    point.insert("landuse".to_string(), 0.0);

    let predictions: Vec<f64> = top
        .entries()
        .iter()
        .map(|entry| fitter.predict(&entry.candidate, &entry.fitted, &point).unwrap())
        .collect();
    let averaged = top.averaged_prediction(&predictions).unwrap();

    // Counts near exp(0.8 + 0.5) = 3.7 in this cell.
    assert!(averaged > 2.0 && averaged < 6.0);

    // The average of inverse-linked predictions, by hand.
    let manual: f64 = top
        .weights()
        .iter()
        .zip(&predictions)
        .map(|(w, p)| w * p)
        .sum();
    assert_abs_diff_eq!(averaged, manual, epsilon = 1e-12);
}

#[test]
fn standardized_pipeline_runs_end_to_end() {
    let data = field_data();
    let global = field_global();
    let (scaled, record) = standardize(&data, &global).unwrap();

    let fitter = GlmFitter::new(&scaled, &global, GlmConfig::default()).unwrap();
    let ranking = dredge(&global, &fitter, &field_config()).unwrap();
    assert_eq!(ranking.len(), 5);

    let top = ranking.select(2.0).unwrap();
    let table = selection_table(&top, &global);
    let rendered = format!("{}", table);
    assert!(rendered.contains("AICc"));

    // Standardized slopes map back to the raw scale through the record.
    let averaged = top.average(&AverageConfig::default()).unwrap();
    if let Some(row) = averaged.iter().find(|a| a.term == "treatment") {
        let raw = record
            .raw_scale_estimate(&mminfer::Term::main("treatment"), row.conditional_estimate)
            .unwrap();
        assert!(raw.is_finite());
    }
}
