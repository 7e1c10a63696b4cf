// Primitives for reading CSV files.

use std::io;

use csv::{Reader, ReaderBuilder};
use log::debug;
use snafu::prelude::*;
use turf_engine::{RespondentTable, TableBuilder};

use crate::turf::io_common::parse_cell;
use crate::turf::*;

pub fn read_csv_table(path: &str) -> BTurfCliResult<RespondentTable> {
    let rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    read_csv_records(rdr, path)
}

/// Reads a table whose first record holds the column names.
pub fn read_csv_records<R: io::Read>(
    mut rdr: Reader<R>,
    path: &str,
) -> BTurfCliResult<RespondentTable> {
    let mut records = rdr.records();
    let header: Vec<String> = match records.next() {
        Some(line_r) => line_r
            .context(CsvLineParseSnafu { lineno: 1usize })?
            .iter()
            .map(|s| s.trim_start_matches('\u{feff}').trim().to_string())
            .collect(),
        None => return Err(Box::new(TurfCliError::EmptyFile { path: path.to_string() })),
    };
    debug!("read_csv_records: header: {:?}", header);
    let mut builder = TableBuilder::from_header(&header).context(TableSnafu {})?;

    for (idx, line_r) in records.enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        if line.len() != header.len() {
            return Err(Box::new(TurfCliError::CsvLineLength {
                lineno,
                found: line.len(),
                expected: header.len(),
            }));
        }
        builder
            .add_row(line.iter().map(parse_cell).collect())
            .context(TableSnafu {})?;
    }
    let table = builder.build();
    debug!(
        "read_csv_records: {}: {} rows, {} columns",
        path,
        table.num_rows(),
        table.num_columns()
    );
    Ok(table)
}
