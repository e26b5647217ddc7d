use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use touchpoint_platform::{ConfigStore, PlatformError};
use tracing::debug;

const HEADER: &str = "#Configuration File";

/// `config.ini` file in Java properties syntax.
///
/// The file is ISO-8859-1 on disk. Characters outside printable ASCII are
/// written as `\uXXXX` escapes.
///
/// Entries are read once by [`ConfigIni::load`] and written back, sorted by
/// key, on [`ConfigStore::persist`]. Comments in the loaded file are not
/// preserved.
#[derive(Debug, Clone)]
pub struct ConfigIni {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl ConfigIni {
    /// Loads `path`. A missing file yields an empty configuration.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, PlatformError> {
        let path = path.into();
        let entries = match fs::read(&path) {
            Ok(bytes) => parse_properties(&decode_latin1(&bytes))?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };

        debug!(path = %path.display(), entries = entries.len(), "loaded configuration");
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for ConfigIni {
    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    fn entries(&self) -> BTreeMap<String, String> {
        self.entries.clone()
    }

    fn persist(&mut self, with_backup: bool) -> Result<(), PlatformError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        if with_backup && self.path.exists() {
            let backup = backup_path(&self.path).ok_or_else(|| {
                PlatformError::Unsupported(format!(
                    "cannot derive backup name for {}",
                    self.path.display()
                ))
            })?;
            fs::copy(&self.path, &backup)?;
            debug!(backup = %backup.display(), "wrote configuration backup");
        }

        fs::write(&self.path, render_properties(&self.entries))?;
        debug!(path = %self.path.display(), entries = self.entries.len(), "saved configuration");
        Ok(())
    }
}

/// Returns `<file>.bak` next to `path`.
pub fn backup_path(path: &Path) -> Option<PathBuf> {
    let mut name = path.file_name()?.to_os_string();
    name.push(".bak");
    Some(path.with_file_name(name))
}

/// Parses Java properties text into a sorted map. Later duplicates win.
pub fn parse_properties(text: &str) -> Result<BTreeMap<String, String>, PlatformError> {
    let mut entries = BTreeMap::new();
    let mut lines = text.lines().enumerate();

    while let Some((index, raw)) = lines.next() {
        let line_no = index + 1;
        let first = raw.trim_start_matches(is_blank);
        if first.is_empty() || first.starts_with('#') || first.starts_with('!') {
            continue;
        }

        let mut logical = String::new();
        let mut current = first;
        loop {
            if !has_continuation(current) {
                logical.push_str(current);
                break;
            }
            logical.push_str(&current[..current.len() - 1]);
            match lines.next() {
                Some((_, next)) => current = next.trim_start_matches(is_blank),
                None => break,
            }
        }

        let (key, value) = split_entry(&logical);
        entries.insert(unescape(key, line_no)?, unescape(value, line_no)?);
    }

    Ok(entries)
}

/// Renders entries in properties syntax with a comment header.
pub fn render_properties(entries: &BTreeMap<String, String>) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for (key, value) in entries {
        escape_into(&mut out, key, true);
        out.push('=');
        escape_into(&mut out, value, false);
        out.push('\n');
    }
    out
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| char::from(byte)).collect()
}

fn is_blank(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\x0c')
}

fn has_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&ch| ch == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (index, ch) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = index;
                break;
            }
            ch if is_blank(ch) => {
                key_end = index;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let mut value = line[key_end..].trim_start_matches(is_blank);
    if let Some(rest) = value.strip_prefix(['=', ':']) {
        value = rest.trim_start_matches(is_blank);
    }
    (key, value)
}

fn unescape(raw: &str, line: usize) -> Result<String, PlatformError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => out.push(unicode_escape(&mut chars, line)?),
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

/// Decodes the digits after `\u`, joining a surrogate pair when the
/// first unit is a high surrogate.
fn unicode_escape(chars: &mut std::str::Chars<'_>, line: usize) -> Result<char, PlatformError> {
    let invalid = |message: String| PlatformError::Parse { line, message };

    let first = hex_unit(chars).ok_or_else(|| invalid("invalid unicode escape".to_string()))?;
    if !(0xD800..=0xDBFF).contains(&first) {
        return char::from_u32(u32::from(first))
            .ok_or_else(|| invalid(format!("unpaired surrogate \\u{first:04X}")));
    }

    let low = match (chars.next(), chars.next()) {
        (Some('\\'), Some('u')) => hex_unit(chars),
        _ => None,
    };
    low.and_then(|low| char::decode_utf16([first, low]).next())
        .and_then(Result::ok)
        .ok_or_else(|| invalid(format!("unpaired surrogate \\u{first:04X}")))
}

fn hex_unit(chars: &mut std::str::Chars<'_>) -> Option<u16> {
    let hex: String = chars.by_ref().take(4).collect();
    if hex.len() != 4 {
        return None;
    }
    u16::from_str_radix(&hex, 16).ok()
}

fn escape_into(out: &mut String, text: &str, is_key: bool) {
    for (index, ch) in text.chars().enumerate() {
        match ch {
            ' ' if is_key || index == 0 => out.push_str("\\ "),
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(ch);
            }
            ' '..='~' => out.push(ch),
            _ => {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{unit:04X}"));
                }
            }
        }
    }
}
