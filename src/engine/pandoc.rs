use super::{process::run_captured, types::*, Backend};
use crate::{config::Config, util::expand_tilde};
use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Converts through the external `pandoc` executable. Keeps tables.
pub struct PandocBackend {
    exe: PathBuf,
    from: String,
    extra_args: Vec<String>,
    timeout: Option<Duration>,
    label: String,
    keep_stderr: bool,
}

impl PandocBackend {
    pub fn new(cfg: &Config) -> Self {
        let timeout = if cfg.pandoc.timeout_seconds > 0 {
            Some(Duration::from_secs(cfg.pandoc.timeout_seconds))
        } else {
            None
        };
        Self {
            exe: expand_tilde(cfg.pandoc.exe.trim()),
            from: cfg.pandoc.from.clone(),
            extra_args: cfg.pandoc.extra_args.clone(),
            timeout,
            label: cfg.pandoc.label.clone(),
            keep_stderr: cfg.debug.keep_pandoc_stderr,
        }
    }

    fn convert_args(&self, req: &ConversionRequest) -> Vec<String> {
        let mut args = vec![
            "--from".to_string(),
            self.from.clone(),
            "--to".to_string(),
            req.target_format.clone(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args.push(req.input.display().to_string());
        args
    }
}

impl Backend for PandocBackend {
    fn id(&self) -> &str {
        "pandoc"
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn fidelity(&self) -> Fidelity {
        Fidelity::High
    }

    fn probe(&self) -> ProbeOut {
        let args = vec!["--version".to_string()];
        match run_captured(&self.exe, &args, Some(Duration::from_secs(30))) {
            Ok(out) if out.status.success() => {
                let stdout = String::from_utf8_lossy(&out.stdout);
                let version = stdout.lines().next().unwrap_or("pandoc").trim().to_string();
                ProbeOut::ok(version)
            }
            Ok(out) => ProbeOut::missing(format!(
                "{} --version exited with {}",
                self.exe.display(),
                out.status
            )),
            Err(err) => ProbeOut::missing(format!("{err:#}")),
        }
    }

    fn convert(&self, req: &ConversionRequest) -> Result<String> {
        let output = run_captured(&self.exe, &self.convert_args(req), self.timeout)?;
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            return Err(anyhow!(
                "pandoc failed on {} ({}): {}",
                req.input.display(),
                output.status,
                stderr.trim()
            ));
        }

        if self.keep_stderr && !stderr.trim().is_empty() {
            debug!("pandoc stderr {}: {}", req.input.display(), stderr.trim());
        }

        String::from_utf8(output.stdout).map_err(|e| anyhow!("pandoc emitted invalid UTF-8: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_argument_list_with_extra_args_before_input() {
        let cfg = Config::default();
        let backend = PandocBackend::new(&cfg);
        let req = ConversionRequest {
            input: PathBuf::from("docs/letter.rtf"),
            out_dir: PathBuf::from("out"),
            target_format: "markdown".into(),
            source_format_tag: "RTF".into(),
            out_extension: "md".into(),
        };
        let args = backend.convert_args(&req);
        assert_eq!(
            args,
            vec!["--from", "rtf", "--to", "markdown", "--wrap=none", "docs/letter.rtf"]
        );
    }

    #[test]
    fn missing_executable_probes_unavailable() {
        let mut cfg = Config::default();
        cfg.pandoc.exe = "/nonexistent/definitely-not-pandoc".into();
        let probe = PandocBackend::new(&cfg).probe();
        assert!(!probe.available);
        assert!(probe.detail.contains("spawning"));
    }
}
