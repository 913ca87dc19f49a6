use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub discovery: Discovery,
    #[serde(default)]
    pub pandoc: Pandoc,
    #[serde(default)]
    pub striprtf: StripRtf,
    #[serde(default)]
    pub install: Install,
    #[serde(default)]
    pub postprocess: Postprocess,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub debug: Debug,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    /// Loads `path` when given, otherwise `./rtf2md.toml` when present,
    /// otherwise the built-in defaults.
    pub fn resolve(user: Option<&Path>) -> Result<Self> {
        if let Some(p) = user {
            return Self::load(p);
        }
        let default = Path::new("rtf2md.toml");
        if default.exists() {
            Self::load(default)
        } else {
            Ok(Self::default())
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Global {
    pub print_summary: bool,
    pub pause_on_exit: bool,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            print_summary: true,
            pause_on_exit: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub input_dir: String,
    pub out_dir: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            input_dir: ".".into(),
            out_dir: "markdown_output".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Discovery {
    pub extension: String,
    pub case_insensitive: bool,
}
impl Default for Discovery {
    fn default() -> Self {
        Self {
            extension: "rtf".into(),
            case_insensitive: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Pandoc {
    pub enabled: bool,
    pub exe: String,
    pub from: String,
    pub to: String,
    pub extra_args: Vec<String>,
    pub timeout_seconds: u64,
    pub label: String,
}
impl Default for Pandoc {
    fn default() -> Self {
        Self {
            enabled: true,
            exe: "pandoc".into(),
            from: "rtf".into(),
            to: "markdown".into(),
            extra_args: vec!["--wrap=none".into()],
            timeout_seconds: 120,
            label: "pandoc (with table support)".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StripRtf {
    pub enabled: bool,
    pub label: String,
}
impl Default for StripRtf {
    fn default() -> Self {
        Self {
            enabled: true,
            label: "striprtf (tables not preserved)".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Install {
    /// Ask before installing. `false` behaves like answering "no".
    pub prompt: bool,
    pub package_command: Vec<String>,
    /// Optional second step that fetches the pandoc executable itself.
    pub download_command: Vec<String>,
    pub timeout_seconds: u64,
}
impl Default for Install {
    fn default() -> Self {
        Self {
            prompt: true,
            package_command: default_package_command(),
            download_command: Vec::new(),
            timeout_seconds: 900,
        }
    }
}

fn default_package_command() -> Vec<String> {
    let argv: &[&str] = if cfg!(target_os = "windows") {
        &[
            "winget",
            "install",
            "--id",
            "JohnMacFarlane.Pandoc",
            "-e",
            "--accept-source-agreements",
            "--accept-package-agreements",
        ]
    } else if cfg!(target_os = "macos") {
        &["brew", "install", "pandoc"]
    } else {
        &[]
    };
    argv.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Postprocess {
    pub normalize_newlines: bool,
    pub normalize_unicode: bool,
    pub trim_trailing_whitespace: bool,
    pub control_chars_to_sanitize: Vec<u8>,
}
impl Default for Postprocess {
    fn default() -> Self {
        Self {
            normalize_newlines: true,
            normalize_unicode: false,
            trim_trailing_whitespace: true,
            control_chars_to_sanitize: (0u8..=8)
                .chain(11..=12)
                .chain(14..=31)
                .chain([127])
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Output {
    pub extension: String,
    pub source_format_tag: String,
    pub create_dir_when_empty: bool,
    pub write_report_json: bool,
    pub report_filename: String,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            extension: "md".into(),
            source_format_tag: "RTF".into(),
            create_dir_when_empty: true,
            write_report_json: false,
            report_filename: "conversion-report.json".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Debug {
    pub keep_pandoc_stderr: bool,
}
impl Default for Debug {
    fn default() -> Self {
        Self {
            keep_pandoc_stderr: true,
        }
    }
}
