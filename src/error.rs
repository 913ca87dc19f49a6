//! Typed errors for conditions callers need to tell apart.
//!
//! Everything else travels as `anyhow::Error` with context attached. Only the
//! fatal "no backend left" state and install failures get their own variants,
//! so the CLI can `downcast_ref` and print a targeted diagnostic.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Rtf2MdError {
    /// Availability resolution ended in `Blocked`.
    #[error(
        "no conversion backend available (probed: {probed})\nInstall pandoc or enable the striprtf fallback."
    )]
    NoBackendAvailable { probed: String },

    #[error("install step '{step}' failed: {reason}")]
    InstallFailed { step: String, reason: String },

    #[error(
        "no install command configured for this platform\nInstall pandoc manually (https://pandoc.org/installing.html) or set install.package_command."
    )]
    NoInstallCommand,
}
