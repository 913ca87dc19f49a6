use crate::probe::{Availability, BackendStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub input_dir: String,
    pub output_dir: String,
    pub availability: Availability,
    pub backends: Vec<String>,
    pub probes: Vec<BackendStatus>,
    pub files_found: usize,
    pub files_converted: usize,
    pub artifacts_created: usize,
    pub files: Vec<FileReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub source: String,
    pub source_sha256: Option<String>,
    pub converted_on: String,
    pub artifacts: Vec<ArtifactReport>,
    pub failures: Vec<AttemptFailure>,
}

impl FileReport {
    pub fn converted(&self) -> bool {
        !self.artifacts.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactReport {
    pub backend: String,
    pub path: String,
    pub bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Missing,
    Convert,
    Write,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptFailure {
    /// Empty when the failure is not tied to a backend (missing input).
    pub backend: String,
    pub stage: FailureStage,
    pub error: String,
}
