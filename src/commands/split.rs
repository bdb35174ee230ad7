use crate::commands::{command::Command, reader_args::ReaderArgs};
use anyhow::Result;
use clap::Parser;
use delimited_reader::{
    InputSource, maybe_compressed_io::open_file, options::unescape_delimiter, with_reader,
};
use log::{info, warn};
use std::{
    io::{BufWriter, Write},
    path::PathBuf,
};

/// Split the input into records and write them out, each followed by the output delimiter.
/// An unterminated fragment at the end of the input is dropped.
#[derive(Parser, Debug)]
#[command(version, verbatim_doc_comment)]
pub(crate) struct Split {
    #[clap(flatten)]
    reader: ReaderArgs,

    /// Output path for records. Use "-" (or omit) for stdout.
    #[clap(long, short = 'o', required = false, default_value = "-")]
    output: PathBuf,

    /// Written after every record. Escapes such as "\n" and "\t" are understood.
    #[clap(long, required = false, default_value = "\\n")]
    output_delimiter: String,
}

impl Split {
    /// Stream records from input to output, returning how many were written.
    fn split(&self) -> Result<u64> {
        let options = self.reader.reader_options()?;
        let output_delimiter = unescape_delimiter(&self.output_delimiter);
        let mut writer = BufWriter::new(open_file(&self.output, true)?);
        let input = self.reader.open_input()?;

        let num_records = with_reader(InputSource::stream(input), options, |reader| {
            reader.for_each_record(|record| -> Result<()> {
                writer.write_all(record.as_bytes())?;
                writer.write_all(&output_delimiter)?;
                Ok(())
            })?;
            if reader.bytes_read() > 0 && reader.records_read() == 0 {
                warn!(
                    "No complete records in {:?}; is the delimiter right?",
                    self.reader.input
                );
            }
            anyhow::Ok(reader.records_read())
        })?;
        writer.flush()?;
        Ok(num_records)
    }
}

/// Implement the Command trait for `Split` struct.
impl Command for Split {
    fn execute(&self) -> Result<()> {
        let num_records = self.split()?;
        info!("Wrote {num_records} records to {:?}", self.output);
        Ok(())
    }
}
