use std::fs;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use tempfile::tempdir;

use super::*;
use crate::logic::explain::{GENERAL_SUGGESTIONS, NORMAL_REASON};
use crate::logic::features::FEATURE_VERSION;

fn fast_config() -> ForestConfig {
    ForestConfig { n_estimators: 50, ..ForestConfig::default() }
}

fn seeded_detector(path: &Path) -> Detector {
    let mut rng = StdRng::seed_from_u64(7);
    Detector::initialize_with_rng(path, fast_config(), &mut rng).unwrap()
}

/// Quiet daytime workload: a few connections, moderate file access, no
/// sensitive paths except the occasional one.
fn baseline_samples() -> Vec<Value> {
    (0..200)
        .map(|i| {
            json!({
                "process_frequency": 1 + i % 10,
                "file_access_count": 50 + i % 20,
                "network_count": 5 + i % 5,
                "sensitive_files": if i % 50 == 0 { 1 } else { 0 },
                "time_of_day": 8 + i % 10,
                "day_of_week": i % 5,
                "container_age": 10_000 + i * 10,
            })
        })
        .collect()
}

// ============================================================================
// LIFECYCLE
// ============================================================================

#[test]
fn test_fresh_initialize_persists_baseline() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("models").join("baseline.json");

    let detector = seeded_detector(&path);

    assert!(path.exists());
    assert!(detector.is_loaded());
    assert_eq!(detector.model_path(), path.as_path());

    let persisted = load_model(&path).unwrap();
    assert_eq!(persisted.feature_version, FEATURE_VERSION);
    assert_eq!(persisted.state.scaler.n_samples_seen(), REFERENCE_SAMPLES);
    assert_eq!(persisted.state.model.n_estimators(), 50);
}

#[test]
fn test_initialize_loads_existing_model_as_is() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("baseline.json");

    let first = seeded_detector(&path);
    // Different config and rng: must be ignored because the file exists
    let second = Detector::initialize_with_rng(
        &path,
        ForestConfig { n_estimators: 3, ..ForestConfig::default() },
        &mut StdRng::seed_from_u64(99),
    )
    .unwrap();

    assert_eq!(*first.snapshot(), *second.snapshot());
    assert_eq!(second.snapshot().model.n_estimators(), 50);
}

#[test]
fn test_layout_mismatch_fails_fast() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("baseline.json");
    seeded_detector(&path);

    let mut doc: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    doc["layout_hash"] = json!(0xDEAD_BEEFu32);
    fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();

    let result = Detector::initialize(&path, fast_config());
    assert!(matches!(
        result,
        Err(DetectorError::Storage(StorageError::LayoutMismatch(_)))
    ));
}

#[test]
fn test_corrupt_file_fails_fast() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("baseline.json");
    fs::write(&path, b"not json").unwrap();

    let result = Detector::initialize(&path, fast_config());
    assert!(matches!(
        result,
        Err(DetectorError::Storage(StorageError::Serialization(_)))
    ));
}

// ============================================================================
// SCORING
// ============================================================================

#[test]
fn test_normalize_score_range_and_direction() {
    assert_eq!(normalize_score(SCORE_MIDPOINT), 0.5);

    let raws: Vec<f64> = (-50..=50).map(|i| i as f64 * 0.1).collect();
    let scores: Vec<f64> = raws.iter().map(|r| normalize_score(*r)).collect();

    for s in &scores {
        assert!(*s > 0.0 && *s < 1.0, "score out of range: {}", s);
    }
    for pair in scores.windows(2) {
        assert!(pair[0] > pair[1], "not strictly decreasing: {:?}", pair);
    }
}

#[test]
fn test_predict_defaults_on_baseline_model() {
    let dir = tempdir().unwrap();
    let detector = seeded_detector(&dir.path().join("baseline.json"));

    let verdict = detector.predict(&json!({})).unwrap();

    assert!(verdict.score > 0.0 && verdict.score < 1.0);
    assert!(verdict.confidence >= 0.0);
    // Forest raw scores sit in [-1, 0)
    assert!(verdict.confidence > 0.0 && verdict.confidence <= 1.0);
    assert!((verdict.score - normalize_score(-verdict.confidence)).abs() < 1e-12);

    if verdict.is_anomaly {
        assert!(!verdict.suggestions.is_empty());
    } else {
        assert_eq!(verdict.reason, NORMAL_REASON);
        assert!(verdict.suggestions.is_empty());
    }
}

#[test]
fn test_sensitive_file_access_is_flagged_and_explained() {
    let dir = tempdir().unwrap();
    let detector = seeded_detector(&dir.path().join("baseline.json"));
    detector.train(&baseline_samples()).unwrap();

    let verdict = detector.predict(&json!({ "sensitive_files": 3 })).unwrap();

    assert!(verdict.is_anomaly, "verdict: {:?}", verdict);
    assert!(verdict.reason.contains("Access to 3 sensitive file(s)"));
    assert_eq!(
        verdict.suggestions[0],
        "Review file access patterns and restrict unnecessary permissions"
    );
    assert!(verdict.suggestions.ends_with(
        &GENERAL_SUGGESTIONS.iter().map(|s| s.to_string()).collect::<Vec<_>>()
    ));
}

#[test]
fn test_typical_sample_is_normal() {
    let dir = tempdir().unwrap();
    let detector = seeded_detector(&dir.path().join("baseline.json"));
    detector.train(&baseline_samples()).unwrap();

    // Sample 107 of the training batch, central on every slot
    let verdict = detector
        .predict(&json!({
            "process_frequency": 8,
            "file_access_count": 57,
            "network_count": 7,
            "sensitive_files": 0,
            "time_of_day": 15,
            "day_of_week": 2,
            "container_age": 11_070,
        }))
        .unwrap();

    assert!(!verdict.is_anomaly, "verdict: {:?}", verdict);
    assert_eq!(verdict.reason, NORMAL_REASON);
    assert!(verdict.suggestions.is_empty());
}

#[test]
fn test_predict_rejects_non_numeric_feature() {
    let dir = tempdir().unwrap();
    let detector = seeded_detector(&dir.path().join("baseline.json"));
    let before = detector.snapshot();

    let err = detector.predict(&json!({ "network_count": "many" })).unwrap_err();
    assert!(matches!(err, DetectorError::Feature(_)));
    assert!(Arc::ptr_eq(&before, &detector.snapshot()));
}

#[test]
fn test_predict_rejects_non_object() {
    let dir = tempdir().unwrap();
    let detector = seeded_detector(&dir.path().join("baseline.json"));

    assert!(matches!(
        detector.predict(&json!("features")),
        Err(DetectorError::Feature(_))
    ));
}

// ============================================================================
// TRAINING
// ============================================================================

#[test]
fn test_train_empty_batch_is_rejected_without_touching_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("baseline.json");
    let detector = seeded_detector(&path);
    let before = fs::read(&path).unwrap();

    assert!(matches!(detector.train(&[]), Err(DetectorError::EmptyBatch)));
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_train_bad_sample_leaves_state_untouched() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("baseline.json");
    let detector = seeded_detector(&path);
    let before_state = detector.snapshot();
    let before_file = fs::read(&path).unwrap();

    let samples = vec![json!({ "network_count": 3 }), json!({ "network_count": [] })];
    assert!(matches!(detector.train(&samples), Err(DetectorError::Feature(_))));

    assert!(Arc::ptr_eq(&before_state, &detector.snapshot()));
    assert_eq!(fs::read(&path).unwrap(), before_file);
}

#[test]
fn test_retrain_is_deterministic() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("baseline.json");
    let detector = seeded_detector(&path);
    let samples = baseline_samples();

    assert_eq!(detector.train(&samples).unwrap(), samples.len());
    let first = load_model(&path).unwrap().state;

    detector.train(&samples).unwrap();
    let second = load_model(&path).unwrap().state;

    assert_eq!(first.scaler, second.scaler);
    assert_eq!(first.model, second.model);
    assert_eq!(*detector.snapshot(), second);
}

#[test]
fn test_retrain_keeps_hyperparameters_and_changes_scores() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("baseline.json");
    let detector = seeded_detector(&path);
    let probe = json!({ "network_count": 40, "file_access_count": 10 });

    let before = detector.predict(&probe).unwrap();
    detector.train(&baseline_samples()).unwrap();
    let after = detector.predict(&probe).unwrap();

    let model = detector.snapshot();
    assert_eq!(model.model.n_estimators(), 50);
    assert_eq!(model.model.contamination(), 0.1);
    assert_eq!(model.scaler.n_samples_seen(), 200);
    assert_ne!(before.score, after.score);
}

#[test]
fn test_persist_failure_is_reported_but_state_is_live() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, b"file").unwrap();

    let reference = reference_dataset(REFERENCE_SAMPLES, &mut StdRng::seed_from_u64(1));
    let state = FittedState::fit(reference.view(), fast_config()).unwrap();
    let detector = Detector::from_state(blocker.join("baseline.json"), state);
    let before = detector.snapshot();

    let err = detector.train(&baseline_samples()).unwrap_err();
    assert!(matches!(err, DetectorError::Persist(_)));
    assert!(err.to_string().contains("not persisted"));

    let after = detector.snapshot();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(after.scaler.n_samples_seen(), 200);
}

#[test]
fn test_concurrent_predict_and_train() {
    let dir = tempdir().unwrap();
    let detector = seeded_detector(&dir.path().join("baseline.json"));
    let samples = baseline_samples();

    std::thread::scope(|scope| {
        for _ in 0..2 {
            scope.spawn(|| detector.train(&samples).unwrap());
        }
        for i in 0..4 {
            let detector = &detector;
            scope.spawn(move || {
                for _ in 0..10 {
                    let v = detector.predict(&json!({ "network_count": i * 10 })).unwrap();
                    assert!(v.score > 0.0 && v.score < 1.0);
                }
            });
        }
    });

    assert_eq!(detector.snapshot().scaler.n_samples_seen(), 200);
    assert_eq!(*detector.snapshot(), load_model(detector.model_path()).unwrap().state);
}
