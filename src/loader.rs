use std::fmt::Display;
use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, Xls, Xlsx};
use thiserror::Error;

use crate::record::{Cell, Dataset};

type Source = Cursor<Vec<u8>>;

/// Errors raised while turning an upload into a [`Dataset`]
#[derive(Debug, Error)]
pub enum LoadError {
    /// The filename extension is not one of `.csv`, `.xls`, `.xlsx`
    #[error("unsupported file extension: '{0}'")]
    UnsupportedFormat(String),

    /// The decoder could not interpret the bytes
    #[error("could not parse file: {0}")]
    Parse(String),

    /// A required column is absent from the header row
    #[error("missing required column '{0}'")]
    MissingColumn(String),
}

/// Tabular formats accepted for upload
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xls,
    Xlsx,
}

impl FileFormat {
    /// Picks the format from a filename suffix, ignoring case
    ///
    /// A bare `.csv` counts as a CSV file.
    ///
    /// # Examples
    /// ```
    /// use datavis::loader::FileFormat;
    ///
    /// assert_eq!(FileFormat::from_filename("Report.XLSX").unwrap(), FileFormat::Xlsx);
    /// assert!(FileFormat::from_filename("notes.txt").is_err());
    /// ```
    pub fn from_filename(filename: &str) -> Result<Self, LoadError> {
        let lowered = filename.to_lowercase();

        if lowered.ends_with(".csv") {
            Ok(FileFormat::Csv)
        } else if lowered.ends_with(".xls") {
            Ok(FileFormat::Xls)
        } else if lowered.ends_with(".xlsx") {
            Ok(FileFormat::Xlsx)
        } else {
            let extension = Path::new(&lowered)
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or_default()
                .to_string();
            Err(LoadError::UnsupportedFormat(extension))
        }
    }
}

/// Detect file type and decode the uploaded bytes
///
/// This function examines the filename extension and calls the CSV or
/// spreadsheet decoder. The extension is checked before any bytes are read.
///
/// # Arguments
/// * `bytes` - Raw contents of the uploaded file
/// * `filename` - Name the client gave the upload
///
/// # Returns
/// * `Result<Dataset, LoadError>` - The decoded rows or the reason they could not be read
pub fn load(bytes: &[u8], filename: &str) -> Result<Dataset, LoadError> {
    match FileFormat::from_filename(filename)? {
        FileFormat::Csv => from_csv(bytes),
        FileFormat::Xls => from_workbook(open_sheet::<Xls<Source>>(bytes)?),
        FileFormat::Xlsx => from_workbook(open_sheet::<Xlsx<Source>>(bytes)?),
    }
}

/// Decode comma separated bytes with a mandatory header row
pub fn from_csv(bytes: &[u8]) -> Result<Dataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| LoadError::Parse(e.to_string()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::Parse("CSV file is empty".into()));
    }

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| LoadError::Parse(e.to_string()))?;
        rows.push(record.iter().map(Cell::from_text).collect());
    }

    Dataset::from_rows(headers, rows)
}

fn open_sheet<R>(bytes: &[u8]) -> Result<R, LoadError>
where
    R: Reader<Source>,
    R::Error: Display,
{
    R::new(Cursor::new(bytes.to_vec())).map_err(|e| LoadError::Parse(e.to_string()))
}

// Reads the first worksheet, treating its first row as the header
fn from_workbook<R>(mut workbook: R) -> Result<Dataset, LoadError>
where
    R: Reader<Source>,
    R::Error: Display,
{
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::Parse("no sheets found in workbook".into()))?
        .map_err(|e| LoadError::Parse(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| LoadError::Parse("worksheet is empty".into()))?
        .iter()
        .map(|cell| cell_from_data(cell).to_label())
        .collect();

    Dataset::from_rows(
        headers,
        rows.map(|row| row.iter().map(cell_from_data).collect::<Vec<_>>()),
    )
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) => Cell::from_text(s),
        Data::Empty => Cell::Empty,
        other => Cell::from_text(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    const SAMPLE_CSV: &str = "name,graduation,year\nA,2023,2021\nB,2024,2022\nC,2023,2021\n";

    #[test]
    fn format_is_case_insensitive() {
        assert_eq!(FileFormat::from_filename("data.csv").unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::from_filename("DATA.Csv").unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::from_filename("old.XLS").unwrap(), FileFormat::Xls);
        assert_eq!(FileFormat::from_filename("a.b.xlsx").unwrap(), FileFormat::Xlsx);
    }

    #[test]
    fn bare_suffix_is_accepted() {
        assert_eq!(FileFormat::from_filename(".csv").unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::from_filename(".XLSX").unwrap(), FileFormat::Xlsx);
    }

    #[test]
    fn rejects_other_extensions() {
        assert!(matches!(
            FileFormat::from_filename("data.txt"),
            Err(LoadError::UnsupportedFormat(ext)) if ext == "txt"
        ));
        assert!(matches!(
            FileFormat::from_filename("README"),
            Err(LoadError::UnsupportedFormat(ext)) if ext.is_empty()
        ));
    }

    #[test]
    fn unsupported_extension_skips_decoding() {
        // These bytes would be a valid CSV, but the name decides.
        let err = load(SAMPLE_CSV.as_bytes(), "data.txt").unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(_)));
    }

    #[test]
    fn loads_csv_rows() {
        let dataset = load(SAMPLE_CSV.as_bytes(), "data.csv").unwrap();
        assert_eq!(dataset.columns, vec!["name", "graduation", "year"]);
        let names: Vec<_> = dataset.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(dataset.records[2].year, 2021);
    }

    #[test]
    fn csv_with_quoted_fields() {
        let csv = "name,graduation,year\n\"Doe, Jane\",\"BSc\",2020\n";
        let dataset = from_csv(csv.as_bytes()).unwrap();
        assert_eq!(dataset.records[0].name, "Doe, Jane");
    }

    #[test]
    fn empty_csv_is_a_parse_error() {
        assert!(matches!(from_csv(b""), Err(LoadError::Parse(_))));
    }

    #[test]
    fn header_only_csv_is_empty_dataset() {
        let dataset = from_csv(b"name,graduation,year\n").unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn csv_missing_column() {
        let err = from_csv(b"name,year\nA,2021\n").unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(c) if c == "graduation"));
    }

    #[test]
    fn garbage_xlsx_is_a_parse_error() {
        let err = load(b"definitely not a zip archive", "data.xlsx").unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
    }

    #[test]
    fn loads_xlsx_rows() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "name").unwrap();
        sheet.write_string(0, 1, "graduation").unwrap();
        sheet.write_string(0, 2, "year").unwrap();
        sheet.write_string(1, 0, "A").unwrap();
        sheet.write_number(1, 1, 2023.0).unwrap();
        sheet.write_number(1, 2, 2021.0).unwrap();
        sheet.write_string(2, 0, "B").unwrap();
        sheet.write_string(2, 1, "MSc").unwrap();
        sheet.write_number(2, 2, 2022.0).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let dataset = load(&bytes, "upload.xlsx").unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records[0].graduation, "2023");
        assert_eq!(dataset.records[0].year, 2021);
        assert_eq!(dataset.records[1].graduation, "MSc");
    }
}
