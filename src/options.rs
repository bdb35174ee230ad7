use crate::error::{ReaderError, Result};
use crate::record::escape_delimiter;
use serde::Deserialize;
use std::{fmt::Display, num::NonZero, str::FromStr};

/// Default number of bytes requested from the source per read (64K).
pub const DEFAULT_CHUNK_SIZE: NonZero<usize> = NonZero::new(65536).unwrap();

/// Option keys recognized by `ReaderOptions::from_pairs` and `ReaderOptions::from_json`.
pub const OPTION_KEYS: [&str; 4] = ["delimiter", "chunkSize", "stripNonPrintable", "forceUTF8"];

/// Configuration for a `DelimitedReader`. Fixed once the reader is built.
///
/// Can be built with the builder-style setters, from string key/value pairs, or from a JSON
/// object. Every route rejects unknown keys, empty delimiters, and a zero chunk size.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawOptions")]
pub struct ReaderOptions {
    /// Record separator. `None` means auto-detect "\r\n" or "\n" from the first chunk.
    pub(crate) delimiter: Option<Vec<u8>>,
    /// Maximum bytes requested per read. Must hold the first record and its delimiter when
    /// auto-detecting.
    pub(crate) chunk_size: NonZero<usize>,
    /// Drop everything except printable ASCII, "\r", and "\n" before buffering.
    pub(crate) strip_non_printable: bool,
    /// Tag records as UTF-8 text. Bytes are never transcoded.
    pub(crate) force_utf8: bool,
}

impl ReaderOptions {
    /// Create options with all defaults: auto-detected delimiter, 64K chunks, stripping and
    /// UTF-8 tagging enabled.
    pub fn new() -> Self {
        Self {
            delimiter: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            strip_non_printable: true,
            force_utf8: true,
        }
    }

    /// Set the record delimiter. Errors if it is empty.
    pub fn delimiter<D: AsRef<[u8]>>(&mut self, delimiter: D) -> Result<&mut Self> {
        let delimiter = delimiter.as_ref();
        if delimiter.is_empty() {
            return Err(ReaderError::configuration("delimiter must not be empty"));
        }
        self.delimiter = Some(delimiter.to_vec());
        Ok(self)
    }

    /// Set the maximum number of bytes requested per read.
    pub fn chunk_size(&mut self, chunk_size: NonZero<usize>) -> &mut Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn strip_non_printable(&mut self, strip_non_printable: bool) -> &mut Self {
        self.strip_non_printable = strip_non_printable;
        self
    }

    pub fn force_utf8(&mut self, force_utf8: bool) -> &mut Self {
        self.force_utf8 = force_utf8;
        self
    }

    /// Build options from string key/value pairs, starting from the defaults. Later pairs
    /// override earlier ones.
    ///
    /// # Errors
    /// Returns `ReaderError::Configuration` for an unknown key or an unparseable value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = Self::new();
        for (key, value) in pairs {
            options.set(key.as_ref(), value.as_ref())?;
        }
        Ok(options)
    }

    /// Build options from a JSON object with the same keys as `from_pairs`. `"delimiter": null`
    /// requests auto-detection.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set a single option by key from its string form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<&mut Self> {
        match key {
            "delimiter" => self.delimiter(value),
            "chunkSize" => Ok(self.chunk_size(parse_value(key, value)?)),
            "stripNonPrintable" => Ok(self.strip_non_printable(parse_value(key, value)?)),
            "forceUTF8" => Ok(self.force_utf8(parse_value(key, value)?)),
            _ => Err(ReaderError::configuration(format!(
                "Unknown option {key:?}, expected one of {OPTION_KEYS:?}"
            ))),
        }
    }
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ReaderOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let delimiter = match self.delimiter {
            Some(ref delimiter) => escape_delimiter(delimiter),
            None => "auto".to_string(),
        };
        write!(
            f,
            "delimiter={delimiter}, chunkSize={}, stripNonPrintable={}, forceUTF8={}",
            self.chunk_size, self.strip_non_printable, self.force_utf8
        )
    }
}

/// Parse an option value, naming the offending key on failure.
fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|err| ReaderError::configuration(format!("Invalid {key} {value:?}: {err}")))
}

/// Wire form of the options, before validation.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOptions {
    #[serde(default)]
    delimiter: Option<String>,
    #[serde(default, rename = "chunkSize")]
    chunk_size: Option<usize>,
    #[serde(default, rename = "stripNonPrintable")]
    strip_non_printable: Option<bool>,
    #[serde(default, rename = "forceUTF8")]
    force_utf8: Option<bool>,
}

impl TryFrom<RawOptions> for ReaderOptions {
    type Error = ReaderError;

    fn try_from(raw: RawOptions) -> Result<Self> {
        let mut options = Self::new();
        if let Some(delimiter) = raw.delimiter {
            options.delimiter(delimiter)?;
        }
        if let Some(chunk_size) = raw.chunk_size {
            options.chunk_size(
                NonZero::new(chunk_size)
                    .ok_or_else(|| ReaderError::configuration("chunkSize must be positive"))?,
            );
        }
        if let Some(strip_non_printable) = raw.strip_non_printable {
            options.strip_non_printable(strip_non_printable);
        }
        if let Some(force_utf8) = raw.force_utf8 {
            options.force_utf8(force_utf8);
        }
        Ok(options)
    }
}

/// Turn the escapes people type on a command line ("\t", "\r\n", "\\", "\0") into the bytes
/// they stand for. Anything else is taken literally.
pub fn unescape_delimiter(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len());
    let mut escaped = false;
    for byte in text.bytes() {
        if escaped {
            match byte {
                b'n' => bytes.push(b'\n'),
                b'r' => bytes.push(b'\r'),
                b't' => bytes.push(b'\t'),
                b'0' => bytes.push(b'\0'),
                b'\\' => bytes.push(b'\\'),
                other => bytes.extend([b'\\', other]),
            }
            escaped = false;
        } else if byte == b'\\' {
            escaped = true;
        } else {
            bytes.push(byte);
        }
    }
    if escaped {
        bytes.push(b'\\');
    }
    bytes
}
