use anyhow::{Result, anyhow};
use noodles_bgzf::io::MultithreadedReader;
use std::{
    fs::{File, OpenOptions, create_dir_all},
    io::{Chain, Cursor, ErrorKind, Read},
    num::NonZero,
    path::Path,
};

/// First bytes of gzipped file
const BGZIP_MAGIC_NUMBER: [u8; 2] = [0x1fu8, 0x8bu8];

/// Helper function to get a File object that can be read from or written to, given the supplied
/// path. The path may be "-", in which case we will read from stdin or write to stdout
pub fn open_file<P: AsRef<Path>>(path: P, for_writing: bool) -> Result<File> {
    if path.as_ref().to_str() == Some("-") {
        let default = if for_writing {
            "/dev/stdout"
        } else {
            "/dev/stdin"
        };
        OpenOptions::new()
            .write(for_writing)
            .read(!for_writing)
            .open(default)
            .map_err(|err| anyhow!("Opening {default}: {err}"))
    } else {
        if for_writing
            && let Some(parent_dir) = path.as_ref().parent()
            && !parent_dir.as_os_str().is_empty()
        {
            create_dir_all(parent_dir)?
        }
        OpenOptions::new()
            .write(for_writing)
            .truncate(for_writing)
            .read(!for_writing)
            .create(for_writing)
            .open(path.as_ref())
            .map_err(|err| {
                let input = path.as_ref();
                anyhow!("Opening {input:?}: {err}")
            })
    }
}

/// Read until `buf` is full or the reader is exhausted, returning how many bytes were read.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(num_bytes) => filled += num_bytes,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

/// Type alias for the chained reader that puts the sniffed magic bytes back in front of the file.
type Inner = Chain<Cursor<Vec<u8>>, File>;

/// Enum for an input that may or may not be BGZF compressed. Either way it reads as plain bytes.
pub enum MaybeCompressedReader {
    Compressed(MultithreadedReader<Inner>),
    Uncompressed(Inner),
}

impl MaybeCompressedReader {
    /// Open a possibly compressed input path. input_path can be set to "-" to read from stdin.
    /// Inputs shorter than the magic number are read as plain bytes.
    pub fn new<P: AsRef<Path>>(
        input_path: P,
        decompression_threads: NonZero<usize>,
    ) -> Result<MaybeCompressedReader> {
        let mut input_file = open_file(input_path, false)?;
        let mut first_bytes = [0u8; 2];
        let num_first = read_up_to(&mut input_file, &mut first_bytes)?;
        let chain: Inner = Cursor::new(first_bytes[..num_first].to_vec()).chain(input_file);
        if first_bytes[..num_first] == BGZIP_MAGIC_NUMBER {
            // it's gzipped, unzip with requested number of threads
            Ok(MaybeCompressedReader::Compressed(
                MultithreadedReader::with_worker_count(decompression_threads, chain),
            ))
        } else {
            // it's not gzipped, hand bytes through untouched; DelimitedReader does its own buffering
            Ok(MaybeCompressedReader::Uncompressed(chain))
        }
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self, MaybeCompressedReader::Compressed(_))
    }
}

impl Read for MaybeCompressedReader {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, std::io::Error> {
        match self {
            MaybeCompressedReader::Compressed(inner) => inner.read(buf),
            MaybeCompressedReader::Uncompressed(inner) => inner.read(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MaybeCompressedReader, open_file};
    use crate::test_utils::random_records::{write_bgzf_input, write_input};
    use anyhow::Result;
    use rstest::rstest;
    use std::{io::Read, num::NonZero};
    use tempfile::TempDir;

    /// Compression is detected from the leading bytes, whatever the file is called.
    #[rstest]
    #[case("plain.txt", false, b"one\ntwo\n")]
    #[case("packed.txt", true, b"one\ntwo\n")]
    #[case("packed.gz", true, b"")]
    #[case("tiny.gz", false, b"x")]
    #[case("empty.txt", false, b"")]
    fn test_compression_sniffed(
        #[case] name: &str,
        #[case] compressed: bool,
        #[case] contents: &[u8],
    ) -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = if compressed {
            write_bgzf_input(&temp_dir.path(), name, contents)?
        } else {
            write_input(&temp_dir.path(), name, contents)?
        };
        let mut reader = MaybeCompressedReader::new(&path, NonZero::new(1usize).unwrap())?;
        assert_eq!(reader.is_compressed(), compressed, "{name}");
        let mut read_back = Vec::new();
        reader.read_to_end(&mut read_back)?;
        assert_eq!(read_back, contents, "{name}");
        Ok(())
    }

    #[test]
    fn test_open_file_creates_parent_dirs() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let nested = temp_dir.path().join("a").join("b").join("out.txt");
        open_file(&nested, true)?;
        assert!(nested.exists());
        assert!(open_file(temp_dir.path().join("missing.txt"), false).is_err());
        Ok(())
    }
}
