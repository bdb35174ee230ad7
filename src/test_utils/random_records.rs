use anyhow::Result;
use rand::Rng;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

/// Bytes that random records are drawn from. Excludes "\r" and "\n" so that records never contain
/// a line terminator, and excludes "|" so it can be used as a custom delimiter.
const RECORD_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 ,.;:-_=+*#@!?'\"()[]{}<>/~";

/// Enum for generating random record sets of different shapes
#[derive(Clone, Copy, Debug)]
pub enum RecordShape {
    Short,     // a few bytes each
    Long,      // hundreds of bytes, longer than the small chunk sizes under test
    WithEmpty, // short, with roughly a third of the records empty
}

impl RecordShape {
    /// Generate `num_records` random records of this shape.
    pub fn random_records(&self, num_records: usize) -> Vec<String> {
        let mut rng = rand::rng();
        (0..num_records)
            .map(|_| {
                let len = match self {
                    RecordShape::Short => rng.random_range(1..8),
                    RecordShape::Long => rng.random_range(100..400),
                    RecordShape::WithEmpty => {
                        if rng.random_bool(0.33) {
                            0
                        } else {
                            rng.random_range(1..8)
                        }
                    }
                };
                random_record(&mut rng, len)
            })
            .collect()
    }

    /// Get a descriptive label for this shape, for assertion messages.
    pub fn label(&self) -> &'static str {
        match self {
            RecordShape::Short => "short",
            RecordShape::Long => "long",
            RecordShape::WithEmpty => "with-empty",
        }
    }
}

/// Make one random printable record of exactly `len` bytes.
fn random_record<R>(rng: &mut R, len: usize) -> String
where
    R: Rng,
{
    (0..len)
        .map(|_| char::from(RECORD_ALPHABET[rng.random_range(0..RECORD_ALPHABET.len())]))
        .collect()
}

/// Join records into a byte stream, terminating every record with `delimiter`.
pub fn terminated<S: AsRef<str>>(records: &[S], delimiter: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for record in records {
        bytes.extend_from_slice(record.as_ref().as_bytes());
        bytes.extend_from_slice(delimiter);
    }
    bytes
}

/// Write `bytes` to a new file called `name` in `temp_path`.
pub fn write_input<P>(temp_path: &P, name: &str, bytes: &[u8]) -> Result<PathBuf>
where
    P: AsRef<Path>,
{
    let mut temp_file = temp_path.as_ref().to_path_buf();
    temp_file.push(name);
    let mut file = fs::File::create(&temp_file)?;
    file.write_all(bytes)?;
    Ok(temp_file)
}

/// Write `bytes` BGZF compressed to a new file called `name` in `temp_path`.
pub fn write_bgzf_input<P>(temp_path: &P, name: &str, bytes: &[u8]) -> Result<PathBuf>
where
    P: AsRef<Path>,
{
    let mut temp_file = temp_path.as_ref().to_path_buf();
    temp_file.push(name);
    let mut writer = noodles_bgzf::io::Writer::new(fs::File::create(&temp_file)?);
    writer.write_all(bytes)?;
    writer.finish()?;
    Ok(temp_file)
}
