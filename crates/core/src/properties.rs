//! Flat `key=value` property files
//!
//! Reads the Java `.properties` dialect used by Gradle's `local.properties`
//! and `key.properties`:
//! - `#` and `!` comment lines, blank lines ignored
//! - `=`, `:` or whitespace separates key from value
//! - a trailing backslash continues the logical line
//! - `\t`, `\n`, `\r`, `\f`, `\uXXXX` escapes
//!
//! A file that does not exist is not an error: it yields an empty source.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// An ordered, read-only set of properties loaded from an optional file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySource {
    origin: Option<PathBuf>,
    entries: Vec<(String, String)>,
}

impl PropertySource {
    /// Source with no keys and no origin
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a property file if it exists.
    ///
    /// A missing path yields an empty source. An existing file that cannot be
    /// read or parsed is an error; the file is read fully and closed before
    /// returning.
    pub fn load_optional(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "property file absent, using defaults");
            return Ok(Self::empty());
        }

        let bytes = std::fs::read(path).map_err(|e| {
            Error::from(e).with_context(format!("While reading {}", path.display()))
        })?;
        let content = String::from_utf8(bytes)
            .map_err(|e| Error::malformed_properties(path, format!("invalid UTF-8: {}", e)))?;

        let mut source = Self::parse(&content).map_err(|e| {
            Error::malformed_properties(path, e.message)
        })?;
        source.origin = Some(path.to_path_buf());

        debug!(path = %path.display(), keys = source.len(), "loaded property file");
        Ok(source)
    }

    /// Parse property file content
    pub fn parse(content: &str) -> Result<Self> {
        let mut source = Self::empty();

        for (line_no, line) in logical_lines(content) {
            let (raw_key, raw_value) = split_key_value(&line);
            let key = unescape(raw_key).map_err(|msg| malformed(line_no, &msg))?;
            let value = unescape(raw_value).map_err(|msg| malformed(line_no, &msg))?;
            source.insert(key, value);
        }

        Ok(source)
    }

    /// File this source was loaded from, if it existed
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    /// Look up a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Look up a key, falling back to `default` when absent
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Look up a key, treating whitespace-only values as absent
    pub fn get_non_blank(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    /// Whether the key is present (possibly with an empty value)
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the source has no keys
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    // Later definitions win but keep the position of the first one.
    fn insert(&mut self, key: String, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }
}

impl FromStr for PropertySource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn malformed(line_no: usize, message: &str) -> Error {
    Error::config_parse(format!("line {}: {}", line_no, message))
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0C')
}

/// Join continued lines, drop comments and blanks. Yields the starting line
/// number of each logical line.
fn logical_lines(content: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, natural) in natural_lines(content).enumerate() {
        let trimmed = natural.trim_start_matches(is_blank);

        if pending.is_none()
            && (trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!'))
        {
            continue;
        }

        let (body, continues) = strip_continuation(trimmed);
        let (start, mut text) = pending.take().unwrap_or((idx + 1, String::new()));
        text.push_str(body);

        if continues {
            pending = Some((start, text));
        } else if !text.is_empty() {
            lines.push((start, text));
        }
    }

    // A continuation on the last line just ends the file
    if let Some((start, text)) = pending {
        if !text.is_empty() {
            lines.push((start, text));
        }
    }

    lines
}

/// Split on `\r\n`, `\n` or a lone `\r`
fn natural_lines(content: &str) -> impl Iterator<Item = &str> {
    let mut rest = content;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        match rest.find(['\r', '\n']) {
            Some(i) => {
                let line = &rest[..i];
                let terminator = if rest[i..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[i + terminator..];
                Some(line)
            }
            None => {
                let line = rest;
                rest = "";
                Some(line)
            }
        }
    })
}

fn strip_continuation(line: &str) -> (&str, bool) {
    let trailing = line.chars().rev().take_while(|&c| c == '\\').count();
    if trailing % 2 == 1 {
        (&line[..line.len() - 1], true)
    } else {
        (line, false)
    }
}

/// Split at the first unescaped `=`, `:` or whitespace
fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    let mut explicit_separator = false;

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                explicit_separator = true;
                break;
            }
            c if is_blank(c) => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let mut rest = &line[key_end..];

    if explicit_separator {
        rest = &rest[1..];
    } else {
        rest = rest.trim_start_matches(is_blank);
        if let Some(stripped) = rest.strip_prefix(['=', ':']) {
            rest = stripped;
        }
    }

    (key, rest.trim_start_matches(is_blank))
}

fn unescape(raw: &str) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0C'),
            Some('u') => {
                let unit = read_utf16_unit(&mut chars)?;
                if (0xD800..0xDC00).contains(&unit) {
                    let low = match (chars.next(), chars.next()) {
                        (Some('\\'), Some('u')) => read_utf16_unit(&mut chars)?,
                        _ => return Err(format!("unpaired surrogate \\u{:04X}", unit)),
                    };
                    let decoded = char::decode_utf16([unit, low])
                        .next()
                        .and_then(|r| r.ok())
                        .ok_or_else(|| format!("invalid surrogate pair \\u{:04X}\\u{:04X}", unit, low))?;
                    out.push(decoded);
                } else {
                    let decoded = char::from_u32(u32::from(unit))
                        .ok_or_else(|| format!("unpaired surrogate \\u{:04X}", unit))?;
                    out.push(decoded);
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

fn read_utf16_unit(chars: &mut std::str::Chars<'_>) -> std::result::Result<u16, String> {
    let hex: String = chars.by_ref().take(4).collect();
    if hex.chars().count() != 4 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("malformed \\uxxxx encoding: \\u{}", hex));
    }
    u16::from_str_radix(&hex, 16).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_basic_separators() {
        let props = PropertySource::parse("a=1\nb: 2\nc 3\nd   =   4\n").unwrap();
        assert_eq!(props.get("a"), Some("1"));
        assert_eq!(props.get("b"), Some("2"));
        assert_eq!(props.get("c"), Some("3"));
        assert_eq!(props.get("d"), Some("4"));
        assert_eq!(props.len(), 4);
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let props = PropertySource::parse("# comment\n! also comment\n\n   \nkey=value\n").unwrap();
        assert_eq!(props.len(), 1);
        assert_eq!(props.get("key"), Some("value"));
    }

    #[test]
    fn test_empty_value_is_present() {
        let props = PropertySource::parse("keyAlias=\nstoreFile=   \n").unwrap();
        assert_eq!(props.get("keyAlias"), Some(""));
        assert!(props.contains_key("keyAlias"));
        assert_eq!(props.get_non_blank("storeFile"), None);
        assert_eq!(props.get("missing"), None);
    }

    #[test]
    fn test_value_keeps_trailing_whitespace_and_inner_separators() {
        let props = PropertySource::parse("url=http://host:8080/a=b  \n").unwrap();
        assert_eq!(props.get("url"), Some("http://host:8080/a=b  "));
    }

    #[test]
    fn test_line_continuation() {
        let props = PropertySource::parse("fruits=apple, \\\n        banana\nnext=1\n").unwrap();
        assert_eq!(props.get("fruits"), Some("apple, banana"));
        assert_eq!(props.get("next"), Some("1"));
    }

    #[test]
    fn test_even_backslashes_do_not_continue() {
        let props = PropertySource::parse("path=C:\\\\\nother=x\n").unwrap();
        assert_eq!(props.get("path"), Some("C:\\"));
        assert_eq!(props.get("other"), Some("x"));
    }

    #[test]
    fn test_escapes() {
        let props =
            PropertySource::parse("key\\ with\\=sep=tab\\there\nuni=caf\\u00e9\nemoji=\\uD83D\\uDE00\n")
                .unwrap();
        assert_eq!(props.get("key with=sep"), Some("tab\there"));
        assert_eq!(props.get("uni"), Some("café"));
        assert_eq!(props.get("emoji"), Some("😀"));
    }

    #[test]
    fn test_malformed_unicode_escape_is_error() {
        let err = PropertySource::parse("ok=1\nbad=\\u12G4\n").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigParseError);
        assert!(err.message.contains("line 2"));
    }

    #[test]
    fn test_truncated_unicode_escape_is_error() {
        assert!(PropertySource::parse("bad=\\u12").is_err());
        assert!(PropertySource::parse("bad=\\uD83D").is_err());
    }

    #[test]
    fn test_carriage_return_only_line_endings() {
        let props = PropertySource::parse("storeFile=upload.jks\rkeyAlias=upload\r").unwrap();
        assert_eq!(props.get("storeFile"), Some("upload.jks"));
        assert_eq!(props.get("keyAlias"), Some("upload"));
    }

    #[test]
    fn test_mixed_line_endings_and_line_numbers() {
        let props = PropertySource::parse("a=1\r\nb=2\rc=3\nd=\\\r  4\n").unwrap();
        assert_eq!(props.get("a"), Some("1"));
        assert_eq!(props.get("b"), Some("2"));
        assert_eq!(props.get("c"), Some("3"));
        assert_eq!(props.get("d"), Some("4"));

        let err = PropertySource::parse("ok=1\rstill=ok\rbad=\\u12\r").unwrap_err();
        assert!(err.message.contains("line 3"));
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let props = PropertySource::parse("a=1\nb=2\na=3\n").unwrap();
        assert_eq!(props.get("a"), Some("3"));
        let keys: Vec<_> = props.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_get_or_defaults() {
        let props = PropertySource::parse("flutter.versionName=2.3.1\n").unwrap();
        assert_eq!(props.get_or("flutter.versionName", "1.0"), "2.3.1");
        assert_eq!(props.get_or("flutter.versionCode", "1"), "1");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let props = PropertySource::load_optional(&temp_dir.path().join("nope.properties")).unwrap();
        assert!(props.is_empty());
        assert!(props.origin().is_none());
    }

    #[test]
    fn test_load_existing_file_records_origin() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("local.properties");
        std::fs::write(&path, "sdk.dir=/opt/android\r\nflutter.versionCode=7\r\n").unwrap();

        let props = PropertySource::load_optional(&path).unwrap();
        assert_eq!(props.origin(), Some(path.as_path()));
        assert_eq!(props.get("sdk.dir"), Some("/opt/android"));
        assert_eq!(props.get("flutter.versionCode"), Some("7"));
    }

    #[test]
    fn test_load_malformed_file_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("key.properties");
        std::fs::write(&path, "storePassword=\\uZZZZ\n").unwrap();

        let err = PropertySource::load_optional(&path).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigParseError);
        assert!(err.context.unwrap().contains("key.properties"));
    }

    #[test]
    fn test_load_invalid_utf8_is_malformed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("key.properties");
        std::fs::write(&path, [b'a', b'=', 0xFF, 0xFE]).unwrap();

        let err = PropertySource::load_optional(&path).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigParseError);
    }

    #[test]
    fn test_load_directory_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = PropertySource::load_optional(temp_dir.path()).unwrap_err();
        assert_ne!(err.code, ErrorCode::ConfigParseError);
    }

    proptest! {
        #[test]
        fn prop_simple_pairs_are_read_back(
            key in "[a-zA-Z][a-zA-Z0-9._-]{0,20}",
            value in "[a-zA-Z0-9./_-][a-zA-Z0-9 ./_-]{0,30}",
        ) {
            let props = PropertySource::parse(&format!("{}={}\n", key, value)).unwrap();
            prop_assert_eq!(props.get(&key), Some(value.as_str()));
        }

        #[test]
        fn prop_parse_never_panics(content in "\\PC{0,200}") {
            let _ = PropertySource::parse(&content);
        }
    }
}
