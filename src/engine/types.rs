use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Backends are attempted in ascending order of this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fidelity {
    High,
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeOut {
    pub available: bool,
    /// Version string when available, reason otherwise.
    pub detail: String,
}

impl ProbeOut {
    pub fn ok(detail: impl Into<String>) -> Self {
        Self {
            available: true,
            detail: detail.into(),
        }
    }

    pub fn missing(reason: impl Into<String>) -> Self {
        Self {
            available: false,
            detail: reason.into(),
        }
    }
}

/// One input document headed for conversion.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub input: PathBuf,
    pub out_dir: PathBuf,
    pub target_format: String,
    pub source_format_tag: String,
    pub out_extension: String,
}

impl ConversionRequest {
    pub fn stem(&self) -> String {
        self.input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string())
    }

    /// `<out_dir>/<stem>_<backend_id>.<ext>`
    pub fn artifact_path(&self, backend_id: &str) -> PathBuf {
        self.out_dir
            .join(format!("{}_{}.{}", self.stem(), backend_id, self.out_extension))
    }

    pub fn input_name(&self) -> String {
        display_name(&self.input)
    }
}

pub fn display_name(p: &Path) -> String {
    p.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| p.display().to_string())
}
