use crate::config::Postprocess;
use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("static regex"));

/// Cleans raw converter output. Applying it twice yields the same text.
pub fn normalize(cfg: &Postprocess, raw: &str) -> String {
    let mut s = raw.to_string();

    if cfg.normalize_newlines {
        s = s.replace("\r\n", "\n").replace('\r', "\n");
    }

    if cfg.normalize_unicode {
        s = s.nfkc().collect::<String>();
    }

    s = sanitize_control_chars(&s, &cfg.control_chars_to_sanitize);

    if cfg.trim_trailing_whitespace {
        s = s
            .lines()
            .map(|l| l.trim_end())
            .collect::<Vec<_>>()
            .join("\n");
    }

    collapse_blank_lines(&s).trim().to_string()
}

/// Two or more blank lines in a row become one.
pub fn collapse_blank_lines(s: &str) -> String {
    BLANK_RUNS.replace_all(s, "\n\n").into_owned()
}

fn sanitize_control_chars(s: &str, codes: &[u8]) -> String {
    if codes.is_empty() {
        return s.to_string();
    }

    let mut mask = [false; 128];
    for &code in codes {
        if (code as usize) < mask.len() {
            mask[code as usize] = true;
        }
    }

    s.chars()
        .filter(|&ch| {
            if ch == '\n' || ch == '\r' || ch == '\t' {
                return true;
            }
            let cp = ch as u32;
            if cp < 128 { !mask[cp as usize] } else { true }
        })
        .collect()
}

/// The block written above every artifact body.
pub fn wrap_with_header(source_tag: &str, converted_on: &str, label: &str, body: &str) -> String {
    format!(
        "**File Type:** {source_tag}\n**Converted on:** {converted_on}\n**Converter:** {label}\n\n---\n\n{body}\n"
    )
}
