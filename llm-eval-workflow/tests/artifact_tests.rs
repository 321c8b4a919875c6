use llm_eval_core::*;
use llm_eval_workflow::*;
use pretty_assertions::assert_eq;
use std::path::Path;

fn unicode_samples() -> Vec<Sample> {
    vec![
        Sample::new(0, "Wie spät ist es?", "Es ist 3 Uhr", "Drei Uhr"),
        Sample::new(1, "東京はどこ?", "日本", "日本です"),
    ]
}

#[tokio::test]
async fn test_write_and_load_samples() {
    let dir = tempfile::tempdir().unwrap();
    let samples = unicode_samples();

    let path = write_samples(dir.path(), "multi", &samples).await.unwrap();

    assert_eq!(path, dir.path().join("multi.json"));
    assert_eq!(load_samples(&path).await.unwrap(), samples);
}

#[tokio::test]
async fn test_artifact_is_readable_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_samples(dir.path(), "raw", &unicode_samples()).await.unwrap();
    let content = std::fs::read_to_string(path).unwrap();

    assert!(content.contains("東京はどこ?"));
    assert!(content.contains("spät"));
    assert!(!content.contains("\\u"));
    assert!(content.starts_with("[\n  {\n    \"index\": 0,"));
}

#[tokio::test]
async fn test_output_dir_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("runs").join("latest");

    let path = write_samples(&nested, "x", &[]).await.unwrap();

    assert!(path.exists());
    assert_eq!(load_samples(&path).await.unwrap(), Vec::<Sample>::new());
}

#[tokio::test]
async fn test_load_missing_artifact() {
    let err = load_samples(Path::new("/nonexistent/eval.json")).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

// ===== JSONL datasets =====

const JSONL: &str = r#"{"messages": [{"role": "user", "content": "2+2?"}, {"role": "assistant", "content": "4"}]}

{"messages": [{"role": "system", "content": "Be brief."}, {"role": "user", "content": "Capital of Italy?"}, {"role": "assistant", "content": "Rome"}]}
{"messages": [{"role": "user", "content": "Color of the sky?"}, {"role": "assistant", "content": "Blue"}]}
"#;

#[tokio::test]
async fn test_jsonl_provider_reads_alias_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("trivia.jsonl"), JSONL).unwrap();
    let provider = JsonlDatasetProvider::new(dir.path());

    let dataset = provider.create_dataset(&DatasetConfig::new("trivia")).await.unwrap();

    assert_eq!(dataset.len(), 3);
    let prompt = dataset.example(1).unwrap().split_label(1).unwrap();
    assert_eq!(prompt.question(), "Capital of Italy?");
    assert_eq!(prompt.reference, "Rome");
}

#[tokio::test]
async fn test_jsonl_provider_honors_path_and_limit() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("custom.jsonl"), JSONL).unwrap();
    let provider = JsonlDatasetProvider::new(dir.path());

    let mut config = DatasetConfig::new("trivia");
    config.path = Some("custom.jsonl".into());
    config.max_samples = Some(2);

    let dataset = provider.create_dataset(&config).await.unwrap();
    assert_eq!(dataset.len(), 2);
}

#[tokio::test]
async fn test_jsonl_provider_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let provider = JsonlDatasetProvider::new(dir.path());

    let err = provider.create_dataset(&DatasetConfig::new("absent")).await.err().unwrap();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[test]
fn test_parse_jsonl_reports_line() {
    let content = "{\"messages\": []}\nnot json\n";
    let err = parse_jsonl(content, Path::new("data.jsonl"), None).unwrap_err();

    assert!(matches!(err, CoreError::Serialization(_)));
    assert!(err.to_string().contains("data.jsonl:2"));
}
