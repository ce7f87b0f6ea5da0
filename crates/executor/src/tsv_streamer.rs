use csv::{ReaderBuilder, StringRecord};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::str::FromStr;
use tokio::sync::mpsc::Sender;
use tracing::{error, info};

use super::error::Error;
use super::types::RateStreamer;
use common::types::RateRecord;

/// Streams `origin<TAB>destination<TAB>rate` lines from a file.
///
/// The whole file is parsed before the first batch is sent, so a malformed
/// line aborts the run before any record reaches the graph.
pub struct TsvStreamer {
    path: PathBuf,
    batch_size: usize,
}

impl TsvStreamer {
    pub fn new(path: impl Into<PathBuf>, batch_size: usize) -> Self {
        TsvStreamer {
            path: path.into(),
            batch_size: batch_size.max(1),
        }
    }

    fn parse_file(&self) -> Result<Vec<RateRecord>, Error> {
        let file = File::open(&self.path).map_err(|e| {
            error!("Failed to read file {}: {:?}", self.path.display(), e);
            Error::IoError(e)
        })?;

        parse_records(file)
    }
}

/// Parses every line of `reader` into a rate record.
///
/// # Errors
/// Returns `Error::Parse` naming the first line that does not hold exactly
/// three non-empty tab-separated fields with a decimal rate. Blank lines are
/// malformed too.
pub fn parse_records<R: Read>(mut reader: R) -> Result<Vec<RateRecord>, Error> {
    let mut content = String::new();
    reader.read_to_string(&mut content)?;

    // The csv reader skips empty records, so blank lines are caught up front.
    if let Some(index) = content.lines().position(|line| line.trim().is_empty()) {
        return Err(Error::Parse {
            line: index as u64 + 1,
            reason: "blank line".to_string(),
        });
    }

    let mut rdr = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quoting(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        let line = row.position().map_or(0, |p| p.line());
        records.push(parse_row(&row, line)?);
    }
    Ok(records)
}

fn parse_row(row: &StringRecord, line: u64) -> Result<RateRecord, Error> {
    let parse_error = |reason: String| Error::Parse { line, reason };

    if row.len() != 3 {
        return Err(parse_error(format!("expected 3 tab-separated fields, found {}", row.len())));
    }
    if row.iter().any(|field| field.trim().is_empty()) {
        return Err(parse_error("empty field".to_string()));
    }

    let raw_rate = row[2].trim();
    let rate = Decimal::from_str(raw_rate)
        .or_else(|_| Decimal::from_scientific(raw_rate))
        .map_err(|_| parse_error(format!("rate {:?} is not a decimal number", raw_rate)))?;

    Ok(RateRecord::new(row[0].trim(), row[1].trim(), rate))
}

#[async_trait::async_trait]
impl RateStreamer for TsvStreamer {
    async fn run_stream(self, sender: Sender<Vec<RateRecord>>) -> Result<usize, Error> {
        let all_records = self.parse_file()?;
        let total_records = all_records.len();
        let mut records_sent = 0;

        info!("TsvStreamer: Starting transfer of {} records...", total_records);

        for chunk in all_records.chunks(self.batch_size) {
            if let Err(e) = sender.send(chunk.to_vec()).await {
                error!(
                    "TsvStreamer shutting down: Writer receiver dropped during send. Error: {}",
                    e
                );
                return Err(Error::ChannelSendFailed);
            }

            records_sent += chunk.len();
        }

        info!("TsvStreamer: Successfully transferred {} records in batches.", records_sent);
        Ok(records_sent)
    }
}
