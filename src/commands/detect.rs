use crate::commands::{command::Command, reader_args::ReaderArgs};
use anyhow::{Result, anyhow};
use clap::Parser;
use delimited_reader::{InputSource, ReaderError, record::escape_delimiter, with_reader};

/// Print the record delimiter the reader would use for the input, escaped ("\n" or "\r\n").
/// Only reads as far as the first record.
#[derive(Parser, Debug)]
#[command(version, verbatim_doc_comment)]
pub(crate) struct Detect {
    #[clap(flatten)]
    reader: ReaderArgs,
}

impl Detect {
    fn detect(&self) -> Result<String> {
        let options = self.reader.reader_options()?;
        let input = self.reader.open_input()?;
        let delimiter = with_reader(InputSource::stream(input), options, |reader| {
            reader.next_record()?;
            Ok::<Option<Vec<u8>>, ReaderError>(reader.delimiter().map(<[u8]>::to_vec))
        })?
        .ok_or_else(|| anyhow!("Unable to determine delimiter for {:?}", self.reader.input))?;
        Ok(escape_delimiter(&delimiter))
    }
}

/// Implement the Command trait for `Detect` struct.
impl Command for Detect {
    fn execute(&self) -> Result<()> {
        println!("{}", self.detect()?);
        Ok(())
    }
}
