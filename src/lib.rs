#![deny(unsafe_code)]

//! Streaming reader that splits a byte stream into delimited records without holding the whole
//! input in memory.

pub mod error;
pub mod maybe_compressed_io;
pub mod options;
pub mod reader;
pub mod record;

pub use error::{ReaderError, Result};
pub use options::ReaderOptions;
pub use reader::{DelimitedReader, InputSource, with_reader};
pub use record::{Delimiter, Encoding, Record};

#[cfg(test)]
mod test_utils;
