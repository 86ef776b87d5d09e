//! On-disk JSON dump of the last response of each endpoint

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while writing a dump
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// The endpoint a response was produced for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Questions,
    QuestionsByIds,
    AnswersOfQuestions,
    AnswersByIds,
    Collectives,
}

impl Endpoint {
    /// File the endpoint's last response is written to
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Questions => "question.json",
            Self::QuestionsByIds => "question_ids.json",
            Self::AnswersOfQuestions => "question_ids_answers.json",
            Self::AnswersByIds => "answer_ids.json",
            Self::Collectives => "collectives.json",
        }
    }
}

/// Writes `body` as pretty JSON to `<dir>/<endpoint file>`
///
/// # Returns
///
/// * `Ok(PathBuf)` - The file written
/// * `Err(OutputError)` - Serialization or the write failed
pub async fn write_dump<T: Serialize>(
    dir: &Path,
    endpoint: Endpoint,
    body: &T,
) -> OutputResult<PathBuf> {
    let json = serde_json::to_string_pretty(body)?;

    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(endpoint.file_name());
    tokio::fs::write(&path, json).await?;

    tracing::debug!("Wrote {}", path.display());
    Ok(path)
}
