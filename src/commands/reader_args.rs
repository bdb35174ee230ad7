use anyhow::{Result, anyhow};
use clap::Args;
use delimited_reader::{
    ReaderOptions, maybe_compressed_io::MaybeCompressedReader, options::unescape_delimiter,
};
use log::debug;
use std::{fs, num::NonZero, path::PathBuf};

/// Parse a "key=value" reader option from the command line.
fn parse_key_value(arg: &str) -> Result<(String, String), String> {
    arg.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("Expected key=value, got {arg:?}"))
}

/// Input and reader settings shared by every subcommand.
#[derive(Args, Debug)]
pub(crate) struct ReaderArgs {
    /// Input file to split into records. May be BGZF compressed. Use "-" for stdin.
    #[clap(long, short = 'i', required = true)]
    pub input: PathBuf,

    /// Record delimiter. Escapes such as "\n", "\r\n", and "\t" are understood. Auto-detects
    /// "\r\n" or "\n" from the first line when omitted.
    #[clap(long, short = 'd', required = false, default_value = None)]
    delimiter: Option<String>,

    /// Maximum number of bytes read per chunk. The first record and its delimiter must fit in
    /// one chunk when the delimiter is auto-detected.
    #[clap(long, short = 'c', required = false, default_value = None)]
    chunk_size: Option<NonZero<usize>>,

    /// Keep non-printable bytes instead of stripping them before splitting.
    #[clap(long, required = false)]
    keep_non_printable: bool,

    /// Treat records as binary rather than UTF-8 text.
    #[clap(long, required = false)]
    binary: bool,

    /// Reader option as key=value (delimiter, chunkSize, stripNonPrintable, forceUTF8). May be
    /// repeated. Applied after --options-json and before the dedicated flags.
    #[clap(long = "option", short = 'x', required = false, value_parser = parse_key_value)]
    option_pairs: Vec<(String, String)>,

    /// JSON file holding a reader options object, e.g. {"delimiter": "|", "chunkSize": 4096}.
    #[clap(long, required = false, default_value = None)]
    options_json: Option<PathBuf>,

    /// Number of threads to use for decompressing BGZF input
    #[clap(long, short = 't', required = false, default_value_t = NonZero::new(num_cpus::get()).unwrap_or(NonZero::new(1usize).unwrap()))]
    pub threads: NonZero<usize>,
}

impl ReaderArgs {
    /// Combine the JSON file, key=value pairs, and dedicated flags into one set of options.
    pub fn reader_options(&self) -> Result<ReaderOptions> {
        let mut options = if let Some(ref json_path) = self.options_json {
            let json = fs::read_to_string(json_path)
                .map_err(|err| anyhow!("Reading {json_path:?}: {err}"))?;
            ReaderOptions::from_json(&json)?
        } else {
            ReaderOptions::new()
        };
        for (key, value) in &self.option_pairs {
            options.set(key, value)?;
        }
        if let Some(ref delimiter) = self.delimiter {
            options.delimiter(unescape_delimiter(delimiter))?;
        }
        if let Some(chunk_size) = self.chunk_size {
            options.chunk_size(chunk_size);
        }
        if self.keep_non_printable {
            options.strip_non_printable(false);
        }
        if self.binary {
            options.force_utf8(false);
        }
        debug!("Reader options: {options}");
        Ok(options)
    }

    /// Open the input, decompressing if needed.
    pub fn open_input(&self) -> Result<MaybeCompressedReader> {
        let input = MaybeCompressedReader::new(&self.input, self.threads)?;
        if input.is_compressed() {
            debug!("Decompressing {:?} with {} thread(s)", self.input, self.threads);
        }
        Ok(input)
    }
}
