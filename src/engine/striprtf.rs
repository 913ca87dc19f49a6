use super::{types::*, Backend};
use crate::{config::Config, rtf::rtf_to_text};
use anyhow::{Context, Result};

/// In-process RTF stripper. Always available, plain text only.
pub struct StripRtfBackend {
    label: String,
}

impl StripRtfBackend {
    pub fn new(cfg: &Config) -> Self {
        Self {
            label: cfg.striprtf.label.clone(),
        }
    }
}

impl Backend for StripRtfBackend {
    fn id(&self) -> &str {
        "striprtf"
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn fidelity(&self) -> Fidelity {
        Fidelity::Fallback
    }

    fn probe(&self) -> ProbeOut {
        ProbeOut::ok(concat!("builtin ", env!("CARGO_PKG_VERSION")))
    }

    fn convert(&self, req: &ConversionRequest) -> Result<String> {
        let bytes = std::fs::read(&req.input)
            .with_context(|| format!("reading {}", req.input.display()))?;
        rtf_to_text(&bytes).with_context(|| format!("stripping {}", req.input.display()))
    }
}
