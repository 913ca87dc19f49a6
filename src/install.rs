use crate::{config::Config, engine::process::run_inherited, error::Rtf2MdError};
use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn};

/// Asks the operator a yes/no question.
pub trait Prompter {
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

/// Tries to make the preferred backend's dependency available.
pub trait Installer {
    fn install(&self) -> Result<()>;
}

/// Interactive terminal prompt.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = dialoguer::Confirm::new()
            .with_prompt(question)
            .default(false)
            .interact()?;
        Ok(answer)
    }
}

/// Answers every question the same way (`--yes`, `--no-install`, or
/// `install.prompt = false`).
pub struct FixedAnswer(pub bool);

impl Prompter for FixedAnswer {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        info!("{question} -> {}", if self.0 { "yes" } else { "no" });
        Ok(self.0)
    }
}

/// Runs `install.package_command`, then `install.download_command` if set.
pub struct CommandInstaller {
    package_command: Vec<String>,
    download_command: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandInstaller {
    pub fn new(cfg: &Config) -> Self {
        let timeout = if cfg.install.timeout_seconds > 0 {
            Some(Duration::from_secs(cfg.install.timeout_seconds))
        } else {
            None
        };
        Self {
            package_command: cfg.install.package_command.clone(),
            download_command: cfg.install.download_command.clone(),
            timeout,
        }
    }
}

impl Installer for CommandInstaller {
    fn install(&self) -> Result<()> {
        if self.package_command.is_empty() {
            return Err(Rtf2MdError::NoInstallCommand.into());
        }

        info!("installing: {}", self.package_command.join(" "));
        run_inherited(&self.package_command, self.timeout).map_err(|e| {
            Rtf2MdError::InstallFailed {
                step: "package".into(),
                reason: format!("{e:#}"),
            }
        })?;

        if !self.download_command.is_empty() {
            info!("fetching executable: {}", self.download_command.join(" "));
            if let Err(e) = run_inherited(&self.download_command, self.timeout) {
                warn!("executable download failed: {e:#}");
                return Err(Rtf2MdError::InstallFailed {
                    step: "download".into(),
                    reason: format!("{e:#}"),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// Chooses the prompter from CLI flags and config.
pub fn prompter_for(cfg: &Config, assume_yes: bool, no_install: bool) -> Box<dyn Prompter> {
    if no_install {
        Box::new(FixedAnswer(false))
    } else if assume_yes {
        Box::new(FixedAnswer(true))
    } else if cfg.install.prompt {
        Box::new(TerminalPrompter)
    } else {
        Box::new(FixedAnswer(false))
    }
}
