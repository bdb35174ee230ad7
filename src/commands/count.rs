use crate::commands::{command::Command, reader_args::ReaderArgs};
use anyhow::Result;
use clap::Parser;
use delimited_reader::{InputSource, ReaderError, with_reader};
use log::info;

/// Count the complete records in the input without writing them anywhere.
#[derive(Parser, Debug)]
#[command(version, verbatim_doc_comment)]
pub(crate) struct Count {
    #[clap(flatten)]
    reader: ReaderArgs,
}

/// Totals from one pass over the input
#[derive(Debug, PartialEq)]
struct Counts {
    records: u64,
    bytes: u64,
    empty_records: u64,
}

impl Count {
    fn count(&self) -> Result<Counts> {
        let options = self.reader.reader_options()?;
        let input = self.reader.open_input()?;
        let counts = with_reader(InputSource::stream(input), options, |reader| {
            let mut empty_records = 0u64;
            reader.for_each_record(|record| {
                if record.is_empty() {
                    empty_records += 1;
                }
                Ok::<(), ReaderError>(())
            })?;
            Ok::<Counts, ReaderError>(Counts {
                records: reader.records_read(),
                bytes: reader.bytes_read(),
                empty_records,
            })
        })?;
        Ok(counts)
    }
}

/// Implement the Command trait for `Count` struct.
impl Command for Count {
    fn execute(&self) -> Result<()> {
        let counts = self.count()?;
        info!(
            "Read {} records ({} empty) from {} bytes.",
            counts.records, counts.empty_records, counts.bytes
        );
        println!("{}", counts.records);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Count, Counts};
    use crate::test_utils::random_records::{RecordShape, terminated, write_input};
    use anyhow::Result;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_count() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let input = write_input(&temp_dir.path(), "in.txt", b"a\n\nb\nc")?;
        let count = Count::try_parse_from(["count", "-i", input.to_str().unwrap(), "-t", "1"])?;
        assert_eq!(
            count.count()?,
            Counts {
                records: 3,
                bytes: 6,
                empty_records: 1
            }
        );
        Ok(())
    }

    #[test]
    fn test_count_matches_records_across_chunk_sizes() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let records = RecordShape::WithEmpty.random_records(300);
        let expected_empty = records.iter().filter(|record| record.is_empty()).count() as u64;
        let input = write_input(&temp_dir.path(), "in.txt", &terminated(&records, b"|"))?;
        for chunk_size in ["1", "5", "4096"] {
            let count = Count::try_parse_from([
                "count",
                "-i",
                input.to_str().unwrap(),
                "-d",
                "|",
                "-c",
                chunk_size,
                "-t",
                "1",
            ])?;
            let counts = count.count()?;
            assert_eq!(counts.records, records.len() as u64, "chunk size {chunk_size}");
            assert_eq!(counts.empty_records, expected_empty, "chunk size {chunk_size}");
        }
        Ok(())
    }
}
