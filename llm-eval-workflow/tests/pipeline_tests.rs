mod common;

use common::{echo_dataset, labeled, EchoBackend};
use llm_eval_core::*;
use llm_eval_metrics::MetricScorer;
use llm_eval_workflow::*;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::Arc;

fn provider(alias: &str, n: usize) -> Arc<InMemoryDatasetProvider> {
    Arc::new(InMemoryDatasetProvider::new().with_dataset(alias, echo_dataset(n)))
}

/// Runs one driver per rank concurrently and returns the reports by rank.
async fn run_ranks(
    world_size: usize,
    datasets: Arc<InMemoryDatasetProvider>,
    configs: Vec<DatasetConfig>,
    output_dir: Option<std::path::PathBuf>,
) -> Vec<Result<EvalReport>> {
    let collectives = InProcessCollective::group(world_size).unwrap();
    let configs = Arc::new(configs);

    let handles: Vec<_> = collectives
        .into_iter()
        .map(|collective| {
            let mut driver = EvaluationDriver::new(
                datasets.clone(),
                Arc::new(EchoBackend::new()),
                Arc::new(MetricScorer::new()),
                Arc::new(collective),
            )
            .with_progress(false);
            if let Some(dir) = &output_dir {
                driver = driver.with_output_dir(dir.clone());
            }
            let configs = Arc::clone(&configs);
            tokio::spawn(async move { driver.run(&configs).await })
        })
        .collect();

    let mut reports = Vec::new();
    for handle in handles {
        reports.push(handle.await.unwrap());
    }
    reports
}

#[tokio::test]
async fn test_five_samples_two_ranks() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatasetConfig::new("toy").with_eval_config(EvalConfig::new("exact_match"));

    let reports = run_ranks(2, provider("toy", 5), vec![config], Some(dir.path().to_path_buf())).await;

    let coordinator = reports[0].as_ref().unwrap();
    let worker = reports[1].as_ref().unwrap();

    // indices 0, 2, 4 match the echo answers
    assert_eq!(coordinator.metrics.get("eval/toy-exact_match"), Some(&0.6));
    assert_eq!(coordinator.output_files, vec![dir.path().join("toy.json")]);
    assert!(worker.is_empty());

    let samples = load_samples(&coordinator.output_files[0]).await.unwrap();
    let indices: Vec<_> = samples.iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert_eq!(samples[3].question, "question 3");
    assert_eq!(samples[3].reference, "answer 3");
    assert_eq!(samples[3].hypothesis, "echo: question 3");
}

#[rstest]
#[case(1, 1)]
#[case(2, 3)]
#[case(3, 2)]
#[case(4, 4)]
#[case(7, 1)]
#[tokio::test]
async fn test_output_order_independent_of_world_size(#[case] world_size: usize, #[case] batch_size: usize) {
    let dir = tempfile::tempdir().unwrap();
    let config = DatasetConfig::new("order").with_batch_size(batch_size);

    let reports = run_ranks(world_size, provider("order", 11), vec![config], Some(dir.path().to_path_buf())).await;
    for report in &reports {
        assert!(report.is_ok());
    }

    let samples = load_samples(&dir.path().join("order.json")).await.unwrap();
    let indices: Vec<_> = samples.iter().map(|s| s.index).collect();
    assert_eq!(indices, (0..11).collect::<Vec<_>>());
    for sample in &samples {
        assert_eq!(sample.question, format!("question {}", sample.index));
    }
}

#[tokio::test]
async fn test_multiple_datasets_in_sequence() {
    let datasets = Arc::new(
        InMemoryDatasetProvider::new()
            .with_dataset("a", echo_dataset(4))
            .with_dataset("b", echo_dataset(3)),
    );
    let configs = vec![
        DatasetConfig::new("a").with_eval_config(EvalConfig::new("exact_match")),
        DatasetConfig::new("b").with_batch_size(2).with_eval_config(EvalConfig::new("contains")),
    ];

    let reports = run_ranks(3, datasets, configs, None).await;
    let coordinator = reports[0].as_ref().unwrap();

    assert_eq!(coordinator.metrics.len(), 2);
    assert_eq!(coordinator.metrics["eval/a-exact_match"], 0.5);
    assert!(coordinator.metrics.contains_key("eval/b-contains"));
    assert!(coordinator.output_files.is_empty());
    assert!(reports[1].as_ref().unwrap().is_empty());
    assert!(reports[2].as_ref().unwrap().is_empty());
}

#[tokio::test]
async fn test_dataset_without_eval_config_only_persists() {
    let dir = tempfile::tempdir().unwrap();
    let driver = EvaluationDriver::new(
        provider("plain", 3),
        Arc::new(EchoBackend::new()),
        Arc::new(MetricScorer::new()),
        Arc::new(LocalCollective),
    )
    .with_output_dir(dir.path())
    .with_progress(false);

    let report = driver.run(&[DatasetConfig::new("plain")]).await.unwrap();

    assert!(report.metrics.is_empty());
    assert_eq!(report.output_files, vec![dir.path().join("plain.json")]);
}

#[tokio::test]
async fn test_rerun_is_deterministic_at_zero_temperature() {
    let driver = EvaluationDriver::new(
        provider("det", 6),
        Arc::new(EchoBackend::new()),
        Arc::new(MetricScorer::new()),
        Arc::new(LocalCollective),
    )
    .with_progress(false);
    let config = DatasetConfig::new("det").with_batch_size(4).with_temperature(0.0);

    let first = driver.evaluate_dataset(&config).await.unwrap().unwrap();
    let second = driver.evaluate_dataset(&config).await.unwrap().unwrap();

    let hypotheses = |o: &DatasetOutcome| o.samples.iter().map(|s| s.hypothesis.clone()).collect::<Vec<_>>();
    assert_eq!(hypotheses(&first), hypotheses(&second));
}

#[tokio::test]
async fn test_generation_params_reach_backend() {
    let driver = EvaluationDriver::new(
        provider("warm", 2),
        Arc::new(EchoBackend::new()),
        Arc::new(MetricScorer::new()),
        Arc::new(LocalCollective),
    )
    .with_progress(false);
    let config = DatasetConfig::new("warm").with_temperature(0.5).with_max_tokens(16);

    let outcome = driver.evaluate_dataset(&config).await.unwrap().unwrap();
    assert_eq!(outcome.samples[0].hypothesis, "echo(0.5): question 0");
}

#[tokio::test]
async fn test_invalid_label_aborts_run() {
    let mut examples = echo_dataset(3).examples().to_vec();
    examples[1] = DatasetExample::new(vec![Message::user("q"), Message::user("not a label")]);
    let datasets = Arc::new(InMemoryDatasetProvider::new().with_dataset("bad", InMemoryDataset::new(examples)));
    let backend = Arc::new(EchoBackend::new());

    let driver = EvaluationDriver::new(
        datasets,
        backend.clone(),
        Arc::new(MetricScorer::new()),
        Arc::new(LocalCollective),
    )
    .with_progress(false);

    let err = driver
        .run(&[DatasetConfig::new("bad").with_batch_size(3)])
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::LabelRole { index: 1, .. }));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_duplicate_aliases_rejected_before_work() {
    let backend = Arc::new(EchoBackend::new());
    let driver = EvaluationDriver::new(
        provider("dup", 2),
        backend.clone(),
        Arc::new(MetricScorer::new()),
        Arc::new(LocalCollective),
    );

    let err = driver
        .run(&[DatasetConfig::new("dup"), DatasetConfig::new("dup")])
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Validation(_)));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_unknown_dataset() {
    let driver = EvaluationDriver::new(
        provider("known", 1),
        Arc::new(EchoBackend::new()),
        Arc::new(MetricScorer::new()),
        Arc::new(LocalCollective),
    );

    let err = driver.run(&[DatasetConfig::new("unknown")]).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn test_max_samples_limits_dataset() {
    let driver = EvaluationDriver::new(
        Arc::new(InMemoryDatasetProvider::new().with_dataset("big", InMemoryDataset::new(vec![
            labeled("a", "1"),
            labeled("b", "2"),
            labeled("c", "3"),
        ]))),
        Arc::new(EchoBackend::new()),
        Arc::new(MetricScorer::new()),
        Arc::new(LocalCollective),
    )
    .with_progress(false);
    let mut config = DatasetConfig::new("big");
    config.max_samples = Some(2);

    let outcome = driver.evaluate_dataset(&config).await.unwrap().unwrap();
    assert_eq!(outcome.samples.len(), 2);
}
