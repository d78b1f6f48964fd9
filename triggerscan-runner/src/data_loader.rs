//! Weekly table loading for the runner.
//!
//! Reads a CSV file or the first worksheet of a spreadsheet with the columns
//! `Date, Open, High, Low, Close, Vol, VolAvg` (in that order, optionally
//! preceded by an unnamed index column as written by dataframe tools) into a
//! `TimeSeriesTable`.
//!
//! Numeric cells are parsed as `f64`. Empty cells become NaN so the
//! predicates can skip them; anything else that fails to parse is an error
//! naming the row and column.

use std::io::Read;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use thiserror::Error;
use tracing::debug;
use triggerscan_core::{TimeSeriesTable, WeeklyRecord};

/// Extensions read as workbooks instead of CSV.
pub const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xls", "xlsx", "xlsm", "xlsb", "ods"];

/// Column names the input must carry, in order.
pub const REQUIRED_COLUMNS: [&str; 7] = ["Date", "Open", "High", "Low", "Close", "Vol", "VolAvg"];

/// Errors from the table loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read workbook {}: {source}", path.display())]
    Sheet {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("workbook {} has no worksheets", path.display())]
    NoWorksheet { path: PathBuf },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("column {position} should be '{expected}' but is '{found}'")]
    ColumnOrder {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("row {row}, column '{column}': cannot parse '{value}' as a number")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("table has no data rows")]
    EmptyTable,
}

/// A loaded table plus its provenance.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: TimeSeriesTable,
    pub source: PathBuf,
    /// BLAKE3 hash over every row, for reproducibility records.
    pub dataset_hash: String,
}

/// Load a weekly table from a CSV file or a spreadsheet, picked by extension.
pub fn load_table(path: &Path) -> Result<LoadedTable, LoadError> {
    let table = if is_spreadsheet(path) {
        read_sheet(path)?
    } else {
        let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        read_table(file)?
    };
    let dataset_hash = compute_dataset_hash(&table);
    debug!(path = %path.display(), rows = table.len(), "loaded weekly table");

    Ok(LoadedTable {
        table,
        source: path.to_path_buf(),
        dataset_hash,
    })
}

/// Parse a weekly table from any CSV reader.
pub fn read_table<R: Read>(reader: R) -> Result<TimeSeriesTable, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let names: Vec<&str> = headers.iter().collect();
    let offset = column_offset(&names)?;

    let mut records = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        let cell = |col: usize| record.get(offset + col).unwrap_or("");
        let number = |col: usize| parse_number(cell(col), row, REQUIRED_COLUMNS[col]);

        records.push(WeeklyRecord {
            date: cell(0).to_string(),
            open: number(1)?,
            high: number(2)?,
            low: number(3)?,
            close: number(4)?,
            volume: number(5)?,
            volume_average: number(6)?,
        });
    }

    if records.is_empty() {
        return Err(LoadError::EmptyTable);
    }
    Ok(TimeSeriesTable::new(records))
}

/// Parse a weekly table from the first worksheet of a workbook.
///
/// The first row is the header. Numeric cells are taken as-is, text cells
/// go through the same parsing as CSV fields, and date cells in the `Date`
/// column are written as `YYYY-MM-DD`.
pub fn read_sheet(path: &Path) -> Result<TimeSeriesTable, LoadError> {
    let sheet_error = |source: calamine::Error| LoadError::Sheet {
        path: path.to_path_buf(),
        source,
    };
    let mut workbook = open_workbook_auto(path).map_err(sheet_error)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::NoWorksheet {
            path: path.to_path_buf(),
        })?
        .map_err(sheet_error)?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .map(|cells| cells.iter().map(|c| sheet_text(Some(c))).collect())
        .unwrap_or_default();
    let names: Vec<&str> = header.iter().map(String::as_str).collect();
    let offset = column_offset(&names)?;

    let mut records = Vec::new();
    for (row, cells) in rows.enumerate() {
        if cells.iter().all(|c| *c == Data::Empty) {
            continue;
        }
        let cell = |col: usize| cells.get(offset + col);
        let number = |col: usize| sheet_number(cell(col), row, REQUIRED_COLUMNS[col]);

        records.push(WeeklyRecord {
            date: sheet_date(cell(0)),
            open: number(1)?,
            high: number(2)?,
            low: number(3)?,
            close: number(4)?,
            volume: number(5)?,
            volume_average: number(6)?,
        });
    }

    if records.is_empty() {
        return Err(LoadError::EmptyTable);
    }
    Ok(TimeSeriesTable::new(records))
}

fn sheet_text(cell: Option<&Data>) -> String {
    cell.map(|c| c.to_string().trim().to_string())
        .unwrap_or_default()
}

fn sheet_date(cell: Option<&Data>) -> String {
    match cell {
        Some(Data::DateTime(dt)) => match dt.as_datetime() {
            Some(value) => value.format("%Y-%m-%d").to_string(),
            None => dt.as_f64().to_string(),
        },
        other => sheet_text(other),
    }
}

fn sheet_number(cell: Option<&Data>, row: usize, column: &str) -> Result<f64, LoadError> {
    match cell {
        Some(Data::Float(value)) => Ok(*value),
        Some(Data::Int(value)) => Ok(*value as f64),
        None | Some(Data::Empty) => Ok(f64::NAN),
        Some(other) => parse_number(other.to_string().trim(), row, column),
    }
}

/// Validate the header and return the index of the `Date` column (0, or 1
/// when a leading unnamed index column is present).
fn column_offset(names: &[&str]) -> Result<usize, LoadError> {
    let offset = usize::from(names.first().is_some_and(|first| first.is_empty()));

    for (i, expected) in REQUIRED_COLUMNS.iter().enumerate() {
        match names.get(offset + i) {
            Some(found) if found == expected => {}
            Some(found) => {
                if names.contains(expected) {
                    return Err(LoadError::ColumnOrder {
                        position: offset + i,
                        expected: expected.to_string(),
                        found: found.to_string(),
                    });
                }
                return Err(LoadError::MissingColumn(expected.to_string()));
            }
            None => return Err(LoadError::MissingColumn(expected.to_string())),
        }
    }
    Ok(offset)
}

fn parse_number(value: &str, row: usize, column: &str) -> Result<f64, LoadError> {
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    value.parse::<f64>().map_err(|_| LoadError::InvalidValue {
        row,
        column: column.to_string(),
        value: value.to_string(),
    })
}

fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SPREADSHEET_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Deterministic BLAKE3 hash over every row of the table.
pub fn compute_dataset_hash(table: &TimeSeriesTable) -> String {
    let mut hasher = blake3::Hasher::new();
    for rec in table.records() {
        hasher.update(rec.date.as_bytes());
        hasher.update(&rec.open.to_le_bytes());
        hasher.update(&rec.high.to_le_bytes());
        hasher.update(&rec.low.to_le_bytes());
        hasher.update(&rec.close.to_le_bytes());
        hasher.update(&rec.volume.to_le_bytes());
        hasher.update(&rec.volume_average.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Date,Open,High,Low,Close,Vol,VolAvg
2019-01-07,10.0,12.0,9.5,11.0,1000,900
2019-01-14,11.0,11.5,10.0,10.5,800,950
";

    #[test]
    fn reads_plain_csv() {
        let table = read_table(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        let first = table.get(0).unwrap();
        assert_eq!(first.date, "2019-01-07");
        assert_eq!(first.low, 9.5);
        assert_eq!(first.volume, 1000.0);
        assert_eq!(first.volume_average, 900.0);
    }

    #[test]
    fn tolerates_leading_index_column() {
        let csv = "\
,Date,Open,High,Low,Close,Vol,VolAvg
60,2019-01-07,10.0,12.0,9.5,11.0,1000,900
";
        let table = read_table(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0).unwrap().date, "2019-01-07");
        assert_eq!(table.get(0).unwrap().volume_average, 900.0);
    }

    #[test]
    fn empty_cells_become_nan() {
        let csv = "\
Date,Open,High,Low,Close,Vol,VolAvg
2019-01-07,10.0,12.0,9.5,11.0,1000,
";
        let table = read_table(csv.as_bytes()).unwrap();
        assert!(table.get(0).unwrap().volume_average.is_nan());
    }

    #[test]
    fn missing_column_is_reported() {
        let csv = "Date,Open,High,Low,Close,Vol\n2019-01-07,1,2,0.5,1.5,10\n";
        let err = read_table(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(ref c) if c == "VolAvg"));
    }

    #[test]
    fn wrong_order_is_reported() {
        let csv = "Date,Open,Low,High,Close,Vol,VolAvg\n2019-01-07,1,0.5,2,1.5,10,9\n";
        let err = read_table(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::ColumnOrder { position: 2, .. }));
    }

    #[test]
    fn lowercase_names_are_missing_columns() {
        let csv = "date,open,high,low,close,vol,volavg\n2019-01-07,1,2,0.5,1.5,10,9\n";
        let err = read_table(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(ref c) if c == "Date"));
    }

    #[test]
    fn bad_number_names_row_and_column() {
        let csv = "Date,Open,High,Low,Close,Vol,VolAvg\n2019-01-07,1,2,abc,1.5,10,9\n";
        let err = read_table(csv.as_bytes()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Low"), "{msg}");
        assert!(msg.contains("abc"), "{msg}");
    }

    #[test]
    fn header_only_is_empty_table() {
        let csv = "Date,Open,High,Low,Close,Vol,VolAvg\n";
        assert!(matches!(
            read_table(csv.as_bytes()).unwrap_err(),
            LoadError::EmptyTable
        ));
    }

    /// Writes `header` and `rows` to the first sheet of a new workbook.
    /// `None` cells are left blank.
    fn write_xlsx(path: &Path, header: &[&str], rows: &[(&str, [Option<f64>; 6])]) {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, name) in header.iter().enumerate() {
            if !name.is_empty() {
                sheet.write_string(0, col as u16, *name).unwrap();
            }
        }
        for (i, (date, values)) in rows.iter().enumerate() {
            let row = i as u32 + 1;
            sheet.write_number(row, 0, i as f64).unwrap();
            sheet.write_string(row, 1, *date).unwrap();
            for (j, value) in values.iter().enumerate() {
                if let Some(v) = value {
                    sheet.write_number(row, j as u16 + 2, *v).unwrap();
                }
            }
        }
        workbook.save(path).unwrap();
    }

    #[test]
    fn reads_first_worksheet_of_xlsx() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("BHP_WEEKLY.xlsx");
        write_xlsx(
            &path,
            &["", "Date", "Open", "High", "Low", "Close", "Vol", "VolAvg"],
            &[
                ("2019-01-07", [Some(10.0), Some(12.0), Some(9.5), Some(11.0), Some(1000.0), Some(900.0)]),
                ("2019-01-14", [Some(11.0), Some(11.5), Some(10.0), Some(10.5), Some(800.0), None]),
            ],
        );

        let loaded = load_table(&path).unwrap();
        let csv_equivalent = read_table(
            "\
,Date,Open,High,Low,Close,Vol,VolAvg
0,2019-01-07,10.0,12.0,9.5,11.0,1000,900
1,2019-01-14,11.0,11.5,10.0,10.5,800,
"
            .as_bytes(),
        )
        .unwrap();

        assert_eq!(loaded.table.len(), 2);
        let first = loaded.table.get(0).unwrap();
        assert_eq!(first.date, "2019-01-07");
        assert_eq!(first.low, 9.5);
        assert_eq!(first.volume_average, 900.0);
        assert!(loaded.table.get(1).unwrap().volume_average.is_nan());
        assert_eq!(loaded.dataset_hash, compute_dataset_hash(&csv_equivalent));
    }

    #[test]
    fn xlsx_header_checked_like_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("RIO_WEEKLY.xlsx");
        write_xlsx(
            &path,
            &["", "Date", "Open", "Low", "High", "Close", "Vol", "VolAvg"],
            &[("2019-01-07", [Some(1.0), Some(0.5), Some(2.0), Some(1.5), Some(10.0), Some(9.0)])],
        );
        let err = load_table(&path).unwrap_err();
        assert!(matches!(err, LoadError::ColumnOrder { position: 3, .. }), "{err}");
    }

    #[test]
    fn non_workbook_xlsx_is_sheet_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("BAD_WEEKLY.xlsx");
        std::fs::write(&path, "Date,Open\n").unwrap();
        let err = load_table(&path).unwrap_err();
        assert!(matches!(err, LoadError::Sheet { .. }), "{err}");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_table(Path::new("/no/such/ABC_WEEKLY.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn dataset_hash_is_deterministic_and_content_sensitive() {
        let a = read_table(SAMPLE.as_bytes()).unwrap();
        let b = read_table(SAMPLE.as_bytes()).unwrap();
        assert_eq!(compute_dataset_hash(&a), compute_dataset_hash(&b));

        let changed = SAMPLE.replace("9.5", "9.4");
        let c = read_table(changed.as_bytes()).unwrap();
        assert_ne!(compute_dataset_hash(&a), compute_dataset_hash(&c));
    }
}
