//! Loading persisted model artifacts and running the CNN end to end.

mod common;

use candle_core::Device;
use pretty_assertions::assert_eq;
use subpulse::classifier::{Classifier, CnnClassifier, ModelArtifacts, ModelFiles, Side};
use subpulse::models::{Comment, Sentiment};
use subpulse::services::SentimentPipeline;
use subpulse::SubpulseError;

use common::{tiny_config, write_model, TINY_WORDS};

fn load(dir: &std::path::Path) -> Result<ModelArtifacts, SubpulseError> {
    ModelArtifacts::load(&ModelFiles::in_dir(dir), Device::Cpu)
}

fn load_error_artifact(err: SubpulseError) -> String {
    match err {
        SubpulseError::Load { artifact, .. } => artifact,
        other => panic!("expected a load error, got {:?}", other),
    }
}

#[test]
fn test_load_complete_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), &tiny_config(3), &TINY_WORDS);

    let artifacts = load(dir.path()).unwrap();
    assert_eq!(artifacts.vocabulary.len(), TINY_WORDS.len());
    assert_eq!(artifacts.decoder.len(), 3);
    assert_eq!(artifacts.shape.max_len, 12);
    assert_eq!(artifacts.shape.padding, Side::Pre);
    assert_eq!(artifacts.classifier.num_labels(), 3);
}

#[test]
fn test_missing_artifact_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), &tiny_config(3), &TINY_WORDS);
    std::fs::remove_file(dir.path().join("labels.json")).unwrap();

    let err = load(dir.path()).err().unwrap();
    assert_eq!(load_error_artifact(err), "labels.json");
}

#[test]
fn test_vocabulary_id_outside_embedding_table() {
    let dir = tempfile::tempdir().unwrap();
    let mut words = TINY_WORDS.to_vec();
    words.push(("overflow", 8));
    write_model(dir.path(), &tiny_config(3), &words);

    let err = load(dir.path()).err().unwrap();
    assert_eq!(load_error_artifact(err), "vocabulary.json");
}

#[test]
fn test_label_count_must_match_output_layer() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), &tiny_config(2), &TINY_WORDS);

    let err = load(dir.path()).err().unwrap();
    assert_eq!(load_error_artifact(err), "labels.json");
}

#[test]
fn test_corrupt_config_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), &tiny_config(3), &TINY_WORDS);
    std::fs::write(dir.path().join("model_config.json"), "{ not json").unwrap();

    let err = load(dir.path()).err().unwrap();
    assert_eq!(load_error_artifact(err), "model_config.json");
}

#[test]
fn test_cnn_outputs_probability_rows() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), &tiny_config(3), &TINY_WORDS);
    let artifacts = load(dir.path()).unwrap();
    let pipeline = SentimentPipeline::from_artifacts(artifacts).unwrap();

    let batch = vec![
        pipeline.prepare("good thread"),
        pipeline.prepare("awful awful bad"),
        pipeline.prepare(""),
    ];
    let classifier =
        CnnClassifier::load(&ModelFiles::in_dir(dir.path()), Device::Cpu).unwrap();
    let rows = classifier.predict(&batch).unwrap();

    assert_eq!(rows.len(), 3);
    for row in rows {
        assert_eq!(row.len(), 3);
        let sum: f32 = row.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6, "row sums to {}", sum);
        assert!(row.iter().all(|p| (0.0..=1.0).contains(p)));
    }
}

#[test]
fn test_cnn_rejects_wrong_sequence_length() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), &tiny_config(3), &TINY_WORDS);
    let classifier =
        CnnClassifier::load(&ModelFiles::in_dir(dir.path()), Device::Cpu).unwrap();

    let mut config = tiny_config(3);
    config.max_len = 5;
    let short = subpulse::classifier::normalize(&[2, 3], &config.shape());
    let err = classifier.predict(&[short]).unwrap_err();
    assert!(matches!(err, SubpulseError::Inference(_)));
}

#[tokio::test]
async fn test_truncated_prefix_does_not_change_label() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), &tiny_config(3), &TINY_WORDS);
    let pipeline = SentimentPipeline::from_artifacts(load(dir.path()).unwrap()).unwrap();

    // Twelve trailing tokens survive pre-truncation; the prefixes differ
    let tail = "good thread great thread bad thread good thread awful thread good great";
    let a = format!("bad awful bad {}", tail);
    let b = format!("great great {}", tail);
    assert_eq!(pipeline.prepare(&a), pipeline.prepare(&b));

    let results = pipeline
        .classify(vec![Comment::new("p", a), Comment::new("p", b)])
        .await
        .unwrap();
    assert_eq!(results[0].label, results[1].label);
}

#[tokio::test]
async fn test_end_to_end_report_counts_every_comment() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), &tiny_config(3), &TINY_WORDS);
    let pipeline = SentimentPipeline::from_artifacts(load(dir.path()).unwrap()).unwrap();

    let comments: Vec<Comment> = ["good", "bad thread", "awful", "great great", "unknown words"]
        .iter()
        .map(|t| Comment::new("Post", *t))
        .collect();
    let (report, results) = pipeline.analyze(comments).await.unwrap();

    assert_eq!(report.total, 5);
    assert_eq!(results.len(), 5);
    let counted: usize = Sentiment::ALL.iter().map(|&l| report.count(l)).sum();
    assert_eq!(counted, 5);
    assert_eq!(report.counts.len(), 3);
}
