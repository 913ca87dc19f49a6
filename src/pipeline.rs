use crate::{
    config::Config,
    engine::{types::display_name, ConversionRequest},
    error::Rtf2MdError,
    postprocess::{normalize, wrap_with_header},
    probe::{Availability, Resolution},
    report::{ArtifactReport, AttemptFailure, FailureStage, FileReport, RunReport},
    util::{ensure_dir, hash_file, now_local_stamp},
};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct Pipeline {
    cfg: Config,
    resolution: Resolution,
}

impl Pipeline {
    /// Fails with [`Rtf2MdError::NoBackendAvailable`] when `resolution` left
    /// nothing to convert with.
    pub fn new(cfg: &Config, resolution: Resolution) -> Result<Self> {
        if resolution.state == Availability::Blocked || resolution.backends.is_empty() {
            return Err(Rtf2MdError::NoBackendAvailable {
                probed: resolution.probed_summary(),
            }
            .into());
        }
        Ok(Self {
            cfg: cfg.clone(),
            resolution,
        })
    }

    pub fn availability(&self) -> Availability {
        self.resolution.state
    }

    /// Input files with the configured extension, sorted by file name.
    /// An unreadable directory yields nothing.
    pub fn discover(&self, input_dir: &Path) -> Vec<PathBuf> {
        let entries = match std::fs::read_dir(input_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("cannot read input dir {}: {e}", input_dir.display());
                return Vec::new();
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!("skipping unreadable entry in {}: {e}", input_dir.display());
                    continue;
                }
            };
            if path.is_file() && self.matches_extension(&path) {
                files.push(path);
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        files
    }

    fn matches_extension(&self, path: &Path) -> bool {
        let want = self.cfg.discovery.extension.trim_start_matches('.');
        match path.extension().and_then(|s| s.to_str()) {
            Some(ext) if self.cfg.discovery.case_insensitive => ext.eq_ignore_ascii_case(want),
            Some(ext) => ext == want,
            None => false,
        }
    }

    pub fn run(&self, input_dir: &Path, out_dir: &Path) -> Result<RunReport> {
        info!("searching for .{} files in {}", self.cfg.discovery.extension, input_dir.display());
        let files = self.discover(input_dir);

        if !files.is_empty() || self.cfg.output.create_dir_when_empty {
            if let Err(e) = ensure_dir(out_dir) {
                warn!("{e:#}");
            }
        }

        if files.is_empty() {
            info!("no .{} files found", self.cfg.discovery.extension);
        } else {
            info!("found {} file(s) to convert", files.len());
        }

        let mut reports = Vec::with_capacity(files.len());
        for input in &files {
            info!("converting: {}", display_name(input));
            reports.push(self.convert_file(input, out_dir));
        }

        let files_converted = reports.iter().filter(|r| r.converted()).count();
        let artifacts_created = reports.iter().map(|r| r.artifacts.len()).sum();

        let report = RunReport {
            input_dir: input_dir.display().to_string(),
            output_dir: out_dir.display().to_string(),
            availability: self.resolution.state,
            backends: self.resolution.backend_ids(),
            probes: self.resolution.statuses.clone(),
            files_found: files.len(),
            files_converted,
            artifacts_created,
            files: reports,
        };

        if self.cfg.output.write_report_json {
            let path = out_dir.join(&self.cfg.output.report_filename);
            let written = serde_json::to_string_pretty(&report)
                .map_err(anyhow::Error::from)
                .and_then(|raw| std::fs::write(&path, raw).map_err(anyhow::Error::from));
            if let Err(e) = written {
                warn!("could not write report {}: {e:#}", path.display());
            }
        }

        Ok(report)
    }

    /// Runs every available backend on one input. Never fails; problems are
    /// recorded in the returned report.
    pub fn convert_file(&self, input: &Path, out_dir: &Path) -> FileReport {
        let req = ConversionRequest {
            input: input.to_path_buf(),
            out_dir: out_dir.to_path_buf(),
            target_format: self.cfg.pandoc.to.clone(),
            source_format_tag: self.cfg.output.source_format_tag.clone(),
            out_extension: self.cfg.output.extension.clone(),
        };
        let name = req.input_name();
        let converted_on = now_local_stamp();

        let mut file_report = FileReport {
            source: input.display().to_string(),
            source_sha256: None,
            converted_on: converted_on.clone(),
            artifacts: Vec::new(),
            failures: Vec::new(),
        };

        if !input.is_file() {
            warn!("skipping missing input: {}", input.display());
            file_report.failures.push(AttemptFailure {
                backend: String::new(),
                stage: FailureStage::Missing,
                error: format!("{} does not exist", input.display()),
            });
            return file_report;
        }

        file_report.source_sha256 = match hash_file(input) {
            Ok(h) => Some(h),
            Err(e) => {
                debug!("hashing {name} failed: {e:#}");
                None
            }
        };

        for backend in &self.resolution.backends {
            let id = backend.id();
            let raw = match backend.convert(&req) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("{id} conversion failed for {name}: {e:#}");
                    file_report.failures.push(AttemptFailure {
                        backend: id.to_string(),
                        stage: FailureStage::Convert,
                        error: format!("{e:#}"),
                    });
                    continue;
                }
            };

            let body = normalize(&self.cfg.postprocess, &raw);
            let content =
                wrap_with_header(&req.source_format_tag, &converted_on, backend.label(), &body);
            let path = req.artifact_path(id);

            match std::fs::write(&path, &content) {
                Ok(()) => {
                    info!("converted with {id}: {name} -> {}", display_name(&path));
                    file_report.artifacts.push(ArtifactReport {
                        backend: id.to_string(),
                        path: path.display().to_string(),
                        bytes: content.len(),
                    });
                }
                Err(e) => {
                    warn!("error writing {id} output {}: {e}", path.display());
                    file_report.failures.push(AttemptFailure {
                        backend: id.to_string(),
                        stage: FailureStage::Write,
                        error: e.to_string(),
                    });
                }
            }
        }

        if !file_report.converted() {
            warn!("failed to convert {name} with any backend");
        }
        file_report
    }
}
