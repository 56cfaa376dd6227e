//! Encoding then decoding a model preserves it and its predictions exactly.

use std::path::PathBuf;

use canopy::inference::PredictorKind;
use canopy::io::{ModelInfo, CURRENT_VERSION_MAJOR, CURRENT_VERSION_MINOR};
use canopy::testing;
use canopy::{Model, PredictOptions, TaskKind};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("canopy-{}-{name}.canopy", std::process::id()))
}

#[test]
fn decoded_models_are_equal() {
    init_logging();
    for model in testing::all_models() {
        let bytes = model.to_bytes().unwrap();
        let decoded = Model::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, model, "{}", model.id());
        // Encoding is deterministic.
        assert_eq!(decoded.to_bytes().unwrap(), bytes, "{}", model.id());
    }
}

#[test]
fn decoded_predictions_are_bit_identical() {
    let options = PredictOptions::builder()
        .compute_feature_contributions(true)
        .build()
        .unwrap();
    let inputs = testing::sample_inputs();

    for model in testing::all_models() {
        let decoded = Model::from_bytes(&model.to_bytes().unwrap()).unwrap();
        for input in &inputs {
            let expected = model.compute_features(input);
            let actual = decoded.compute_features(input);
            let expected_bits: Vec<u32> = expected.iter().map(|v| v.to_bits()).collect();
            let actual_bits: Vec<u32> = actual.iter().map(|v| v.to_bits()).collect();
            assert_eq!(actual_bits, expected_bits, "{}", model.id());
        }

        // Covers-free trees cannot be explained; compare plain predictions instead.
        let options = if model.id().contains("no-covers") {
            PredictOptions::default()
        } else {
            options.clone()
        };
        assert_eq!(
            decoded.predict(&inputs, &options),
            model.predict(&inputs, &options),
            "{}",
            model.id()
        );
    }
}

#[test]
fn path_round_trip() {
    init_logging();
    let model = testing::tree_binary_model();
    let path = temp_path("tree-binary");

    model.write_path(&path).unwrap();
    let loaded = Model::from_path(&path);
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded.unwrap(), model);
}

#[test]
fn missing_path_is_io_error() {
    let path = temp_path("does-not-exist");
    assert!(matches!(
        Model::from_path(&path),
        Err(canopy::DecodeError::Io(_))
    ));
}

#[test]
fn write_to_matches_to_bytes() {
    let model = testing::linear_multiclass_model();
    let mut buffer = Vec::new();
    model.write_to(&mut buffer).unwrap();
    assert_eq!(buffer, model.to_bytes().unwrap());
}

#[test]
fn inspect_reads_header_only() {
    let model = testing::tree_multiclass_model();
    let mut bytes = model.to_bytes().unwrap();
    let payload_size = bytes.len() - canopy::io::HEADER_SIZE;
    // The payload is not looked at.
    bytes.truncate(canopy::io::HEADER_SIZE);

    let info = ModelInfo::inspect(&bytes).unwrap();
    assert_eq!(info.version, (CURRENT_VERSION_MAJOR, CURRENT_VERSION_MINOR));
    assert_eq!(info.predictor, PredictorKind::TreeEnsemble);
    assert_eq!(info.task, TaskKind::MulticlassClassification);
    assert_eq!(info.n_features, testing::N_FEATURES);
    assert_eq!(info.n_outputs, 3);
    assert!(info.has_covers);
    assert_eq!(info.payload_size, payload_size);

    let info = ModelInfo::inspect(&testing::linear_regression_model().to_bytes().unwrap()).unwrap();
    assert_eq!(info.predictor, PredictorKind::Linear);
    assert_eq!(info.task, TaskKind::Regression);
    assert!(!info.has_covers);
}
