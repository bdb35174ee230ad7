use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReaderError>;

/// Everything that can go wrong while configuring or running a `DelimitedReader`.
#[derive(Error, Debug)]
pub enum ReaderError {
    /// Unknown option key, or a value that cannot be used. Raised before any I/O.
    #[error("Invalid reader configuration: {0}")]
    Configuration(String),
    /// No line terminator could be found within the first chunk of input.
    #[error(
        "Malformed data. Could not find \\r\\n or \\n within the chunk size of {chunk_size}. \
         Read {bytes_read} bytes from stream"
    )]
    MalformedInput { chunk_size: usize, bytes_read: u64 },
    /// Failure reported by the underlying source, passed through untouched.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ReaderError {
    pub(crate) fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration(message.into())
    }
}

impl From<serde_json::Error> for ReaderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}
