pub mod pandoc;
pub mod process;
pub mod striprtf;
pub mod types;

use crate::config::Config;
use anyhow::Result;

pub use types::{ConversionRequest, Fidelity, ProbeOut};

pub trait Backend {
    /// Short identifier used in artifact file names.
    fn id(&self) -> &str;
    /// Human-readable name written into the artifact header.
    fn label(&self) -> &str;
    fn fidelity(&self) -> Fidelity;
    fn probe(&self) -> ProbeOut;
    /// Raw converted text, before normalization.
    fn convert(&self, req: &ConversionRequest) -> Result<String>;
}

/// Every backend enabled in `cfg`, in priority order.
pub fn build_backends(cfg: &Config) -> Vec<Box<dyn Backend>> {
    let mut backends: Vec<Box<dyn Backend>> = Vec::new();
    if cfg.pandoc.enabled {
        backends.push(Box::new(pandoc::PandocBackend::new(cfg)));
    }
    if cfg.striprtf.enabled {
        backends.push(Box::new(striprtf::StripRtfBackend::new(cfg)));
    }
    backends
}
