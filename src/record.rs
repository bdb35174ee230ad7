use memchr::{memchr, memmem::Finder};
use std::{borrow::Cow, fmt::Display, str::Utf8Error};

/// How the bytes of a record should be interpreted. This is only a tag: bytes are never
/// transcoded or repaired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Binary,
}

impl Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Encoding::Utf8 => write!(f, "UTF-8"),
            Encoding::Binary => write!(f, "binary"),
        }
    }
}

/// One record from the stream with its delimiter stripped. Borrows the reader's buffer, so it
/// only lives until the next record is requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Record<'a> {
    bytes: &'a [u8],
    encoding: Encoding,
}

impl<'a> Record<'a> {
    pub fn new(bytes: &'a [u8], encoding: Encoding) -> Self {
        Record { bytes, encoding }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Shortcut to get length of the record in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// View the record as text. Fails if the bytes are not valid UTF-8, whatever the encoding
    /// tag says.
    pub fn text(&self) -> Result<&'a str, Utf8Error> {
        std::str::from_utf8(self.bytes)
    }

    /// View the record as text, substituting U+FFFD for invalid sequences.
    pub fn text_lossy(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.bytes)
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }
}

/// State of the record delimiter. Starts `Unknown` unless configured, and once `Fixed` never
/// changes for the rest of the session. A fixed delimiter carries its own searcher.
#[derive(Clone, Debug)]
pub enum Delimiter {
    Unknown,
    Fixed(Finder<'static>),
}

impl Delimiter {
    pub const LF: &'static [u8] = b"\n";
    pub const CRLF: &'static [u8] = b"\r\n";

    /// Fix the delimiter to `delimiter`, which must not be empty.
    pub fn fixed(delimiter: &[u8]) -> Self {
        Delimiter::Fixed(Finder::new(delimiter).into_owned())
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Delimiter::Unknown)
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Delimiter::Unknown => None,
            Delimiter::Fixed(finder) => Some(finder.needle()),
        }
    }

    /// Offset of the first occurrence of the delimiter in `haystack`. Always `None` while the
    /// delimiter is unknown.
    pub fn find(&self, haystack: &[u8]) -> Option<usize> {
        match self {
            Delimiter::Unknown => None,
            Delimiter::Fixed(finder) => finder.find(haystack),
        }
    }

    /// Find the line terminator that ends the first line of `buf`: "\r\n" if the first "\n" is
    /// preceded by "\r", otherwise "\n".
    pub fn detect(buf: &[u8]) -> Option<&'static [u8]> {
        let newline = memchr(b'\n', buf)?;
        if newline > 0 && buf[newline - 1] == b'\r' {
            Some(Self::CRLF)
        } else {
            Some(Self::LF)
        }
    }
}

/// Render a delimiter with control characters escaped, for logs and the CLI.
pub fn escape_delimiter(delimiter: &[u8]) -> String {
    delimiter
        .iter()
        .flat_map(|byte| std::ascii::escape_default(*byte))
        .map(char::from)
        .collect()
}

/// Printable ASCII plus carriage return and line feed.
fn is_retained(byte: u8) -> bool {
    matches!(byte, b' '..=b'~' | b'\r' | b'\n')
}

/// Append `chunk` to `buf`, dropping every byte that is not printable ASCII, "\r", or "\n".
pub(crate) fn extend_printable(buf: &mut Vec<u8>, chunk: &[u8]) {
    buf.extend(chunk.iter().copied().filter(|&byte| is_retained(byte)));
}
