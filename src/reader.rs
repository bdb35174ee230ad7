use crate::error::{ReaderError, Result};
use crate::options::ReaderOptions;
use crate::record::{Delimiter, Encoding, Record, escape_delimiter, extend_printable};
use log::{debug, trace};
use std::{
    fs::File,
    io::{Error as IoError, Read},
    ops::Range,
    path::{Path, PathBuf},
};

/// Splits a byte source into records separated by a delimiter, reading one chunk at a time.
///
/// Bytes are pulled from the source in chunks of at most `chunk_size`, optionally stripped of
/// non-printable characters, and appended to an internal buffer. Every complete record in the
/// buffer is handed out with its delimiter removed; the incomplete tail waits for the next chunk.
/// When the source runs dry, an unterminated tail is discarded, never delivered.
///
/// If no delimiter was configured it is detected from the first line terminator in the input
/// ("\r\n" or "\n") and then kept for the rest of the session.
pub struct DelimitedReader<R: Read> {
    source: R,
    options: ReaderOptions,
    delimiter: Delimiter,
    /// Bytes read but not yet emitted. Everything before `consumed` has already been emitted.
    buffer: Vec<u8>,
    consumed: usize,
    /// Where the next delimiter search starts; everything before it is known delimiter-free.
    search_from: usize,
    /// Scratch space for raw reads, before filtering. Grows only as far as the source fills it.
    chunk: Vec<u8>,
    bytes_read: u64,
    records_read: u64,
    finished: bool,
}

impl<R: Read> DelimitedReader<R> {
    /// Create a reader over `source`. Nothing is read until records are requested.
    pub fn new(source: R, options: ReaderOptions) -> Self {
        let delimiter = match options.delimiter {
            Some(ref delimiter) => Delimiter::fixed(delimiter),
            None => Delimiter::Unknown,
        };
        DelimitedReader {
            source,
            options,
            delimiter,
            buffer: Vec::new(),
            consumed: 0,
            search_from: 0,
            chunk: Vec::new(),
            bytes_read: 0,
            records_read: 0,
            finished: false,
        }
    }

    /// Call `callback` with every record in the stream, in order. Stops at the first error,
    /// whether it comes from the source, delimiter detection, or the callback itself.
    pub fn for_each_record<F, E>(&mut self, mut callback: F) -> std::result::Result<(), E>
    where
        F: FnMut(Record<'_>) -> std::result::Result<(), E>,
        E: From<ReaderError>,
    {
        while let Some(record) = self.next_record()? {
            callback(record)?;
        }
        Ok(())
    }

    /// Get the next complete record, reading more chunks from the source as needed. Returns
    /// `None` at end-of-data, or after any earlier error.
    pub fn next_record(&mut self) -> Result<Option<Record<'_>>> {
        loop {
            if let Some(range) = self.next_record_range() {
                self.records_read += 1;
                return Ok(Some(Record::new(&self.buffer[range], self.encoding())));
            }
            if self.finished {
                return Ok(None);
            }
            self.compact();
            match self.read_cycle() {
                Ok(0) => {
                    self.finish();
                    return Ok(None);
                }
                Ok(_) => {}
                Err(err) => {
                    self.finished = true;
                    return Err(err);
                }
            }
        }
    }

    /// The delimiter in use, or `None` while it is still being detected.
    pub fn delimiter(&self) -> Option<&[u8]> {
        self.delimiter.as_bytes()
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Raw bytes pulled from the source so far, before stripping.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Records handed out so far.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Give back the source. Any buffered, unemitted bytes are lost.
    pub fn into_inner(self) -> R {
        self.source
    }

    fn encoding(&self) -> Encoding {
        if self.options.force_utf8 {
            Encoding::Utf8
        } else {
            Encoding::Binary
        }
    }

    /// Find the next delimiter-terminated record in the buffer and mark it consumed. Returns the
    /// record's range with the delimiter excluded.
    fn next_record_range(&mut self) -> Option<Range<usize>> {
        let delimiter_len = self.delimiter.as_bytes()?.len();
        let start = self.consumed;
        match self.delimiter.find(&self.buffer[self.search_from..]) {
            Some(offset) => {
                let end = self.search_from + offset;
                self.consumed = end + delimiter_len;
                self.search_from = self.consumed;
                Some(start..end)
            }
            None => {
                // the last delimiter.len() - 1 bytes may be the start of a delimiter split
                // across chunks
                self.search_from = self
                    .buffer
                    .len()
                    .saturating_sub(delimiter_len - 1)
                    .max(start);
                None
            }
        }
    }

    /// Drop already-emitted bytes from the front of the buffer.
    fn compact(&mut self) {
        if self.consumed > 0 {
            self.buffer.drain(..self.consumed);
            self.search_from -= self.consumed;
            self.consumed = 0;
        }
    }

    /// One read-chunk cycle: pull a chunk into the buffer, then settle the delimiter if it is
    /// still unknown. Returns the number of raw bytes read, 0 at end-of-data.
    fn read_cycle(&mut self) -> Result<usize> {
        let num_bytes = self.read_chunk()?;
        if num_bytes > 0 && self.delimiter.is_unknown() {
            self.detect_delimiter()?;
        }
        Ok(num_bytes)
    }

    /// Read up to `chunk_size` bytes from the source into the buffer, filtering if requested.
    /// Short reads are retried until the chunk is full or the source reports end-of-data.
    /// Returns the number of raw bytes read, 0 at end-of-data.
    fn read_chunk(&mut self) -> Result<usize> {
        let chunk_size = self.options.chunk_size.get() as u64;
        self.chunk.clear();
        let filled = (&mut self.source)
            .take(chunk_size)
            .read_to_end(&mut self.chunk)?;
        self.bytes_read += filled as u64;
        if self.options.strip_non_printable {
            extend_printable(&mut self.buffer, &self.chunk[..filled]);
        } else {
            self.buffer.extend_from_slice(&self.chunk[..filled]);
        }
        trace!(
            "Read {filled} bytes ({} total), {} bytes buffered",
            self.bytes_read,
            self.buffer.len() - self.consumed
        );
        Ok(filled)
    }

    /// Look for the first line terminator within the first `chunk_size` bytes of the buffer.
    /// While no more than one chunk has been read, a missing terminator only means the input may
    /// be short, so detection waits for the next read. Past that, the first record plus its
    /// terminator did not fit in a chunk and the input is malformed.
    fn detect_delimiter(&mut self) -> Result<()> {
        let chunk_size = self.options.chunk_size.get();
        let pending = &self.buffer[self.consumed..];
        let first_chunk = &pending[..chunk_size.min(pending.len())];
        if let Some(delimiter) = Delimiter::detect(first_chunk) {
            debug!("Detected delimiter \"{}\"", escape_delimiter(delimiter));
            self.delimiter = Delimiter::fixed(delimiter);
            Ok(())
        } else if self.bytes_read <= chunk_size as u64 {
            Ok(())
        } else {
            Err(ReaderError::MalformedInput {
                chunk_size: self.options.chunk_size.get(),
                bytes_read: self.bytes_read,
            })
        }
    }

    /// End of data: settle the delimiter and discard whatever unterminated bytes remain.
    fn finish(&mut self) {
        if self.delimiter.is_unknown() {
            // short input without any line terminator
            debug!("No line terminator found, defaulting delimiter to \"\\n\"");
            self.delimiter = Delimiter::fixed(Delimiter::LF);
        }
        let discarded = self.buffer.len() - self.consumed;
        if discarded > 0 {
            debug!("Discarding {discarded} unterminated bytes at end of stream");
        }
        self.buffer.clear();
        self.consumed = 0;
        self.search_from = 0;
        self.finished = true;
        debug!(
            "Read {} records from {} bytes",
            self.records_read, self.bytes_read
        );
    }
}

/// Where `with_reader` gets its bytes: a path to open, or a source that is already open.
pub enum InputSource<'a> {
    Path(PathBuf),
    Stream(Box<dyn Read + 'a>),
}

impl<'a> InputSource<'a> {
    pub fn path<P: AsRef<Path>>(path: P) -> Self {
        InputSource::Path(path.as_ref().to_path_buf())
    }

    pub fn stream<S: Read + 'a>(stream: S) -> Self {
        InputSource::Stream(Box::new(stream))
    }

    /// Open the source. Paths are opened read-only; no text conversion happens anywhere.
    fn open(self) -> Result<Box<dyn Read + 'a>> {
        match self {
            InputSource::Path(path) => {
                let file = File::open(&path)
                    .map_err(|err| IoError::new(err.kind(), format!("Opening {path:?}: {err}")))?;
                Ok(Box::new(file))
            }
            InputSource::Stream(stream) => Ok(stream),
        }
    }
}

/// Run `body` with a reader over `input`. The underlying handle belongs to this call and is
/// released exactly once when it returns, however `body` exits.
pub fn with_reader<'a, T, E, F>(
    input: InputSource<'a>,
    options: ReaderOptions,
    body: F,
) -> std::result::Result<T, E>
where
    F: FnOnce(&mut DelimitedReader<Box<dyn Read + 'a>>) -> std::result::Result<T, E>,
    E: From<ReaderError>,
{
    let mut reader = DelimitedReader::new(input.open()?, options);
    body(&mut reader)
}
