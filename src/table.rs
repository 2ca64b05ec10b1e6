//! Delimited experiment tables
//!
//! Reads the bout table into rows of string labels and writes exported bout
//! rows back out with the same delimiter.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::config::TableOptions;
use crate::error::PatternError;
use crate::types::Row;

/// A table split into header records and data rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Leading records excluded from analysis
    pub head_rows: Vec<Vec<String>>,
    /// Data rows with the column offset already removed
    pub rows: Vec<Row<String>>,
}

/// Read a table from any reader
pub fn read_table<R: Read>(reader: R, options: &TableOptions) -> Result<Table, PatternError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut table = Table::default();
    for (n, record) in csv_reader.records().enumerate() {
        let record = record?;
        if n < options.head_rows {
            table
                .head_rows
                .push(record.iter().map(str::to_string).collect());
            continue;
        }
        if let Some(max_rows) = options.max_rows {
            if table.rows.len() >= max_rows {
                info!("Reached row limit of {} rows", max_rows);
                break;
            }
        }

        let row: Row<String> = record
            .iter()
            .skip(options.offset)
            .map(str::to_string)
            .collect();
        table.rows.push(row);
    }

    debug!(
        "Read {} header rows and {} data rows",
        table.head_rows.len(),
        table.rows.len()
    );
    Ok(table)
}

/// Read a table from a file path
pub fn read_table_path(path: &Path, options: &TableOptions) -> Result<Table, PatternError> {
    let file = File::open(path)?;
    read_table(file, options)
}

/// Write rows, one line per row, joined by `delimiter`
pub fn write_rows<W, L>(writer: W, rows: &[Vec<L>], delimiter: u8) -> Result<(), PatternError>
where
    W: Write,
    L: AsRef<[u8]>,
{
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_writer(writer);

    for row in rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write rows to a file path, replacing any existing file
pub fn write_rows_path<L: AsRef<[u8]>>(
    path: &Path,
    rows: &[Vec<L>],
    delimiter: u8,
) -> Result<(), PatternError> {
    let file = File::create(path)?;
    write_rows(file, rows, delimiter)
}
