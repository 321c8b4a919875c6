//! Per-dataset result artifacts: `<output_dir>/<alias>.json`.

use llm_eval_core::{CoreError, Result, Sample};
use std::path::{Path, PathBuf};

pub fn artifact_path(output_dir: &Path, alias: &str) -> PathBuf {
    output_dir.join(format!("{}.json", alias))
}

/// Writes the ordered samples as an indented UTF-8 JSON array. Non-ASCII
/// text is written as-is, not escaped. Creates `output_dir` if needed.
pub async fn write_samples(output_dir: &Path, alias: &str, samples: &[Sample]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| persistence(output_dir, e))?;

    let path = artifact_path(output_dir, alias);
    let json = serde_json::to_string_pretty(samples)?;
    tokio::fs::write(&path, json)
        .await
        .map_err(|e| persistence(&path, e))?;

    Ok(path)
}

pub async fn load_samples(path: &Path) -> Result<Vec<Sample>> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CoreError::NotFound(path.display().to_string())
        } else {
            persistence(path, e)
        }
    })?;
    Ok(serde_json::from_str(&content)?)
}

fn persistence(path: &Path, err: std::io::Error) -> CoreError {
    CoreError::Persistence(format!("{}: {}", path.display(), err))
}
