//! Plain-text extraction from RTF.
//!
//! A single forward scan over the document. Group state (`{`/`}`) carries two
//! things: whether the group is an ignorable destination, and the current
//! `\ucN` replacement count. Formatting is dropped; paragraph, line, tab and
//! table-cell breaks survive as whitespace or `|`.

use anyhow::{bail, Result};

/// Destinations whose content is never text.
const DESTINATIONS: &[&str] = &[
    "aftncn", "aftnsep", "aftnsepc", "annotation", "atnauthor", "atndate", "atnicn", "atnid",
    "atnparent", "atnref", "atntime", "atrfend", "atrfstart", "author", "background",
    "bkmkend", "bkmkstart", "blipuid", "buptim", "category", "colorschememapping", "colortbl",
    "comment", "company", "creatim", "datafield", "datastore", "defchp", "defpap", "do",
    "doccomm", "docvar", "dptxbxtext", "ebcend", "ebcstart", "factoidname", "falt", "fchars",
    "ffdeftext", "ffentrymcr", "ffexitmcr", "ffformat", "ffhelptext", "ffl", "ffname",
    "ffstattext", "file", "filetbl", "fldinst", "fldtype", "fname", "fontemb", "fontfile",
    "fonttbl", "footer", "footerf", "footerl", "footerr", "footnote", "formfield", "ftncn",
    "ftnsep", "ftnsepc", "g", "generator", "gridtbl", "header", "headerf", "headerl",
    "headerr", "hl", "hlfr", "hlinkbase", "hlloc", "hlsrc", "hsv", "htmltag", "info",
    "keycode", "keywords", "latentstyles", "lchars", "levelnumbers", "leveltext", "lfolevel",
    "linkval", "list", "listlevel", "listname", "listoverride", "listoverridetable",
    "listpicture", "liststylename", "listtable", "listtext", "lsdlockedexcept", "macc",
    "maccPr", "mailmerge", "manager", "mmath", "mmathPict", "mmathPr", "nesttableprops",
    "nextfile", "nonesttables", "objalias", "objclass", "objdata", "object", "objname",
    "objsect", "objtime", "oldcprops", "oldpprops", "oldsprops", "oldtprops", "oleclsid",
    "operator", "panose", "password", "passwordhash", "pgp", "pgptbl", "picprop", "pict",
    "pn", "pnseclvl", "pntext", "pntxta", "pntxtb", "printim", "private", "propname",
    "protend", "protstart", "protusertbl", "pxe", "result", "revtbl", "revtim", "rsidtbl",
    "rxe", "shp", "shpgrp", "shpinst", "shppict", "shprslt", "shptxt", "sn", "sp",
    "staticval", "stylesheet", "subject", "sv", "svb", "tc", "template", "themedata", "title",
    "txe", "ud", "upr", "userprops", "wgrffmtfilter", "windowcaption", "writereservation",
    "writereservhash", "xe", "xform", "xmlattrname", "xmlattrvalue", "xmlclose", "xmlname",
    "xmlnstbl", "xmlopen",
];

fn special_word(word: &str) -> Option<&'static str> {
    Some(match word {
        "par" | "line" | "row" | "nestrow" => "\n",
        "sect" | "page" => "\n\n",
        "tab" => "\t",
        "cell" | "nestcell" => "|",
        "emdash" => "\u{2014}",
        "endash" => "\u{2013}",
        "emspace" => "\u{2003}",
        "enspace" => "\u{2002}",
        "qmspace" => "\u{2005}",
        "bullet" => "\u{2022}",
        "lquote" => "\u{2018}",
        "rquote" => "\u{2019}",
        "ldblquote" => "\u{201C}",
        "rdblquote" => "\u{201D}",
        _ => return None,
    })
}

/// Windows-1252 differs from Latin-1 only in 0x80..=0x9F.
fn decode_cp1252(b: u8) -> char {
    let cp: u32 = match b {
        0x80 => 0x20AC,
        0x82 => 0x201A,
        0x83 => 0x0192,
        0x84 => 0x201E,
        0x85 => 0x2026,
        0x86 => 0x2020,
        0x87 => 0x2021,
        0x88 => 0x02C6,
        0x89 => 0x2030,
        0x8A => 0x0160,
        0x8B => 0x2039,
        0x8C => 0x0152,
        0x8E => 0x017D,
        0x91 => 0x2018,
        0x92 => 0x2019,
        0x93 => 0x201C,
        0x94 => 0x201D,
        0x95 => 0x2022,
        0x96 => 0x2013,
        0x97 => 0x2014,
        0x98 => 0x02DC,
        0x99 => 0x2122,
        0x9A => 0x0161,
        0x9B => 0x203A,
        0x9C => 0x0153,
        0x9E => 0x017E,
        0x9F => 0x0178,
        other => other as u32,
    };
    char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER)
}

#[derive(Clone, Copy)]
struct GroupState {
    ignorable: bool,
    uc: usize,
}

struct Stripper {
    out: String,
    stack: Vec<GroupState>,
    cur: GroupState,
    /// Replacement characters still to drop after a `\uN`.
    pending_skip: usize,
    high_surrogate: Option<u32>,
    /// Undecoded bytes of the current plain-text run.
    literal: Vec<u8>,
}

impl Stripper {
    fn new() -> Self {
        Self {
            out: String::new(),
            stack: Vec::new(),
            cur: GroupState {
                ignorable: false,
                uc: 1,
            },
            pending_skip: 0,
            high_surrogate: None,
            literal: Vec::new(),
        }
    }

    /// Text characters and `\'hh` escapes count against `pending_skip`.
    fn text(&mut self, ch: char) {
        if self.pending_skip > 0 {
            self.pending_skip -= 1;
            return;
        }
        if !self.cur.ignorable {
            self.out.push(ch);
        }
    }

    fn flush_literal(&mut self) {
        if self.literal.is_empty() {
            return;
        }
        let run = std::mem::take(&mut self.literal);
        for ch in String::from_utf8_lossy(&run).chars() {
            self.text(ch);
        }
    }

    fn push_str(&mut self, s: &str) {
        if !self.cur.ignorable {
            self.out.push_str(s);
        }
    }

    fn open_group(&mut self) {
        self.pending_skip = 0;
        self.stack.push(self.cur);
    }

    fn close_group(&mut self) {
        self.pending_skip = 0;
        if let Some(prev) = self.stack.pop() {
            self.cur = prev;
        }
    }

    fn unicode(&mut self, param: i64) {
        let code = (if param < 0 { param + 0x10000 } else { param }) as u32;
        let ch = match code {
            0xD800..=0xDBFF => {
                self.high_surrogate = Some(code);
                None
            }
            0xDC00..=0xDFFF => self.high_surrogate.take().and_then(|hi| {
                char::from_u32(0x10000 + ((hi - 0xD800) << 10) + (code - 0xDC00))
            }),
            _ => Some(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)),
        };
        if let Some(ch) = ch {
            if !self.cur.ignorable {
                self.out.push(ch);
            }
        }
        self.pending_skip = self.cur.uc;
    }

    fn word(&mut self, word: &str, param: Option<i64>) {
        self.pending_skip = 0;
        if DESTINATIONS.binary_search(&word).is_ok() {
            self.cur.ignorable = true;
            return;
        }
        if self.cur.ignorable {
            return;
        }
        if let Some(s) = special_word(word) {
            self.push_str(s);
        } else if word == "uc" {
            self.cur.uc = param.unwrap_or(1).max(0) as usize;
        } else if word == "u" {
            if let Some(p) = param {
                self.unicode(p);
            }
        }
    }
}

/// Extracts the visible text of an RTF document.
///
/// Works on raw bytes so `\binN` skips exactly N bytes. Literal text is
/// decoded as UTF-8 (lossy); `\'hh` escapes as Windows-1252.
/// Fails when the input does not open with `{\rtf`.
pub fn rtf_to_text(src: impl AsRef<[u8]>) -> Result<String> {
    let src = src.as_ref();
    let body = src.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(src).trim_ascii_start();
    if !body.starts_with(b"{\\rtf") {
        bail!("not an RTF document (missing {{\\rtf header)");
    }

    let len = body.len();
    let mut st = Stripper::new();
    let mut i = 0;

    while i < len {
        let b = body[i];
        if !matches!(b, b'{' | b'}' | b'\\' | b'\r' | b'\n') {
            st.literal.push(b);
            i += 1;
            continue;
        }
        st.flush_literal();

        match b {
            b'{' => {
                st.open_group();
                i += 1;
            }
            b'}' => {
                st.close_group();
                i += 1;
            }
            b'\r' | b'\n' => i += 1,
            _ => {
                i += 1;
                let Some(&next) = body.get(i) else { break };

                if next.is_ascii_alphabetic() {
                    let start = i;
                    while i < len && body[i].is_ascii_alphabetic() {
                        i += 1;
                    }
                    let word = String::from_utf8_lossy(&body[start..i]);

                    let negative = body.get(i) == Some(&b'-')
                        && body.get(i + 1).is_some_and(|c| c.is_ascii_digit());
                    if negative {
                        i += 1;
                    }
                    let digits_start = i;
                    while i < len && body[i].is_ascii_digit() {
                        i += 1;
                    }
                    let param = if i > digits_start {
                        let v = std::str::from_utf8(&body[digits_start..i])
                            .ok()
                            .and_then(|d| d.parse::<i64>().ok())
                            .unwrap_or(i64::from(i32::MAX));
                        Some(if negative { -v } else { v })
                    } else {
                        None
                    };
                    if body.get(i) == Some(&b' ') {
                        i += 1;
                    }

                    if word == "bin" {
                        let skip = param.unwrap_or(0).max(0) as usize;
                        i = i.saturating_add(skip).min(len);
                        continue;
                    }
                    st.word(&word, param);
                    continue;
                }

                i += 1;
                match next {
                    b'\\' | b'{' | b'}' => {
                        st.pending_skip = 0;
                        st.push_str(char::from(next).encode_utf8(&mut [0; 4]));
                    }
                    b'~' => {
                        st.pending_skip = 0;
                        st.push_str("\u{a0}");
                    }
                    b'_' => {
                        st.pending_skip = 0;
                        st.push_str("-");
                    }
                    b'*' => st.cur.ignorable = true,
                    b'\'' => {
                        let hi = body.get(i).and_then(|&c| hex_digit(c));
                        let lo = body.get(i + 1).and_then(|&c| hex_digit(c));
                        if let (Some(hi), Some(lo)) = (hi, lo) {
                            i += 2;
                            st.text(decode_cp1252((hi << 4) | lo));
                        }
                    }
                    b'\r' | b'\n' => {
                        st.pending_skip = 0;
                        st.push_str("\n");
                    }
                    _ => st.pending_skip = 0,
                }
            }
        }
    }
    st.flush_literal();

    Ok(st.out)
}

fn hex_digit(b: u8) -> Option<u8> {
    if !b.is_ascii_hexdigit() {
        return None;
    }
    (b as char).to_digit(16).map(|d| d as u8)
}
