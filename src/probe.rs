//! Backend availability, resolved once per run.
//!
//! `Unchecked` -> `Ready` when a high-fidelity backend probes fine. Otherwise
//! `NeedsInstall`, which asks the operator, maybe installs, re-probes, and
//! ends in `Ready`, `DegradedReady` (fallback only) or `Blocked` (nothing).

use crate::{
    engine::{Backend, Fidelity},
    install::{Installer, Prompter},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    Unchecked,
    NeedsInstall,
    Ready,
    DegradedReady,
    Blocked,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendStatus {
    pub id: String,
    pub label: String,
    pub fidelity: Fidelity,
    pub available: bool,
    pub detail: String,
}

impl BackendStatus {
    fn of(backend: &dyn Backend) -> Self {
        let probe = backend.probe();
        Self {
            id: backend.id().to_string(),
            label: backend.label().to_string(),
            fidelity: backend.fidelity(),
            available: probe.available,
            detail: probe.detail,
        }
    }
}

pub struct Resolution {
    pub state: Availability,
    /// States visited, starting with `Unchecked`.
    pub trail: Vec<Availability>,
    pub statuses: Vec<BackendStatus>,
    /// Available backends in priority order.
    pub backends: Vec<Box<dyn Backend>>,
}

impl Resolution {
    pub fn backend_ids(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.id().to_string()).collect()
    }

    pub fn probed_summary(&self) -> String {
        if self.statuses.is_empty() {
            return "none enabled".to_string();
        }
        self.statuses
            .iter()
            .map(|s| format!("{}: {}", s.id, s.detail))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Probes each backend once, without prompting or installing.
pub fn probe_all(backends: &[Box<dyn Backend>]) -> Vec<BackendStatus> {
    backends.iter().map(|b| BackendStatus::of(b.as_ref())).collect()
}

fn high_ready(statuses: &[BackendStatus]) -> bool {
    statuses
        .iter()
        .any(|s| s.fidelity == Fidelity::High && s.available)
}

fn degraded_or_blocked(statuses: &[BackendStatus]) -> Availability {
    if statuses
        .iter()
        .any(|s| s.fidelity == Fidelity::Fallback && s.available)
    {
        Availability::DegradedReady
    } else {
        Availability::Blocked
    }
}

pub fn resolve(
    mut backends: Vec<Box<dyn Backend>>,
    prompter: &mut dyn Prompter,
    installer: &dyn Installer,
) -> Resolution {
    backends.sort_by_key(|b| b.fidelity());

    let mut trail = vec![Availability::Unchecked];
    let mut statuses = probe_all(&backends);
    for s in &statuses {
        info!(
            "backend {} available={} ({})",
            s.id, s.available, s.detail
        );
    }

    let has_high = statuses.iter().any(|s| s.fidelity == Fidelity::High);

    let state = if high_ready(&statuses) {
        Availability::Ready
    } else if !has_high {
        degraded_or_blocked(&statuses)
    } else {
        trail.push(Availability::NeedsInstall);

        let missing = statuses
            .iter()
            .find(|s| s.fidelity == Fidelity::High)
            .map(|s| s.label.clone())
            .unwrap_or_default();
        warn!("{missing} is not available; it is needed for table conversion");
        let question = format!("{missing} is not installed. Install it now?");

        let accepted = prompter.confirm(&question).unwrap_or_else(|e| {
            warn!("prompt failed, treating as 'no': {e:#}");
            false
        });

        if accepted {
            match installer.install() {
                Ok(()) => {
                    for (b, s) in backends.iter().zip(statuses.iter_mut()) {
                        if b.fidelity() == Fidelity::High && !s.available {
                            *s = BackendStatus::of(b.as_ref());
                        }
                    }
                }
                Err(e) => warn!("installation failed: {e:#}"),
            }
        }

        if high_ready(&statuses) {
            info!("{missing} installed; resuming");
            Availability::Ready
        } else {
            degraded_or_blocked(&statuses)
        }
    };

    match state {
        Availability::DegradedReady => {
            warn!("continuing with fallback only (tables may be broken)")
        }
        Availability::Blocked => warn!("no conversion backend available"),
        _ => {}
    }
    trail.push(state);

    let backends = backends
        .into_iter()
        .zip(statuses.iter())
        .filter(|(_, s)| s.available)
        .map(|(b, _)| b)
        .collect();

    Resolution {
        state,
        trail,
        statuses,
        backends,
    }
}
