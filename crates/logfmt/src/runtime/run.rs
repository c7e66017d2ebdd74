//! Run — read inputs, parse each as one batch, print records as JSON lines.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::parser::{ParseError, RecordParser};
use crate::record::Record;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Failed to read {input}: {source}")]
    Read {
        input: String,
        #[source]
        source: io::Error,
    },

    #[error("{input}: {source}")]
    Parse {
        input: String,
        #[source]
        source: ParseError,
    },

    #[error("Failed to write output: {0}")]
    Write(#[from] io::Error),

    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Parse every file (or stdin when `files` is empty) and write records to
/// stdout. Returns the number of records written.
pub fn run<P: RecordParser>(parser: &P, files: &[PathBuf]) -> Result<usize, RunError> {
    let stdout = io::stdout();
    run_to(parser, files, BufWriter::new(stdout.lock()))
}

/// [`run`] writing to `out`. Inputs are processed in order and the first
/// failing one stops the run.
pub fn run_to<P, W>(parser: &P, files: &[PathBuf], mut out: W) -> Result<usize, RunError>
where
    P: RecordParser,
    W: Write,
{
    let mut total = 0;
    if files.is_empty() {
        total += process(parser, "<stdin>", io::stdin().lock(), &mut out)?;
    } else {
        for path in files {
            let name = path.display().to_string();
            let file = File::open(path).map_err(|source| RunError::Read {
                input: name.clone(),
                source,
            })?;
            total += process(parser, &name, file, &mut out)?;
        }
    }

    out.flush()?;
    info!("Wrote {} records", total);
    Ok(total)
}

/// Read `input` to the end, parse it as one batch and write the records.
/// Nothing is written when the batch fails.
pub fn process<P, R, W>(parser: &P, name: &str, mut input: R, out: &mut W) -> Result<usize, RunError>
where
    P: RecordParser,
    R: Read,
    W: Write,
{
    let mut buf = Vec::new();
    input.read_to_end(&mut buf).map_err(|source| RunError::Read {
        input: name.to_string(),
        source,
    })?;
    debug!(input = name, bytes = buf.len(), "Read input");

    let records = parser.parse(&buf).map_err(|source| {
        error!(input = name, "Parse failed: {}", source);
        RunError::Parse {
            input: name.to_string(),
            source,
        }
    })?;

    write_records(&records, out)?;
    Ok(records.len())
}

/// One JSON object per line.
pub fn write_records<W: Write>(records: &[Record], out: &mut W) -> Result<(), RunError> {
    for record in records {
        serde_json::to_writer(&mut *out, record)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}
