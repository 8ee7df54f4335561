use serde::Serialize;

use crate::loader::LoadError;

/// Column holding the person's name, used as the bar chart category
pub const NAME_COLUMN: &str = "name";

/// Column holding the graduation category, used by the pie chart and filter
pub const GRADUATION_COLUMN: &str = "graduation";

/// Column holding the current year, used as the bar height and filter
pub const YEAR_COLUMN: &str = "year";

static EMPTY_CELL: Cell = Cell::Empty;

/// A single decoded cell before it is coerced into a typed field
///
/// CSV input only ever produces `Text` and `Empty`; spreadsheet input may
/// also produce numbers.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Empty,
}

impl Cell {
    /// Builds a cell from raw text, trimming whitespace
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    /// Renders the cell as a category label
    ///
    /// Integral floats lose their fractional part so a spreadsheet cell
    /// holding `2023.0` compares equal to the form value `2023`.
    pub fn to_label(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) if f.fract() == 0.0 && f.is_finite() => format!("{}", *f as i64),
            Cell::Float(f) => f.to_string(),
            Cell::Bool(b) => b.to_string(),
            Cell::Empty => String::new(),
        }
    }

    /// Interprets the cell as a whole year, if possible
    pub fn to_year(&self) -> Option<i64> {
        match self {
            Cell::Int(i) => Some(*i),
            Cell::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            Cell::Text(s) => s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0 && f.is_finite())
                    .map(|f| f as i64)
            }),
            _ => None,
        }
    }
}

/// One row of uploaded data, reduced to the fields the charts need
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Record {
    pub name: String,
    pub graduation: String,
    pub year: i64,
}

/// An ordered collection of records sharing one header row
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dataset {
    /// Header row of the uploaded file, in file order
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

/// Positions of the required columns inside a header row
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ColumnIndex {
    name: usize,
    graduation: usize,
    year: usize,
}

impl ColumnIndex {
    fn resolve(headers: &[String]) -> Result<Self, LoadError> {
        let find = |column: &str| {
            headers
                .iter()
                .position(|h| h.trim() == column)
                .ok_or_else(|| LoadError::MissingColumn(column.to_string()))
        };

        Ok(ColumnIndex {
            name: find(NAME_COLUMN)?,
            graduation: find(GRADUATION_COLUMN)?,
            year: find(YEAR_COLUMN)?,
        })
    }
}

impl Dataset {
    /// Builds a dataset from a header row and decoded data rows
    ///
    /// Every required column must be present in `headers`. Short rows are
    /// padded with empty cells, so a row missing its `year` fails the year
    /// check rather than being silently dropped.
    ///
    /// # Errors
    /// * `LoadError::MissingColumn` if a required header is absent
    /// * `LoadError::Parse` if a `year` cell is not a whole number
    pub fn from_rows<I>(headers: Vec<String>, rows: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = Vec<Cell>>,
    {
        let index = ColumnIndex::resolve(&headers)?;
        let mut records = Vec::new();

        for (row_no, row) in rows.into_iter().enumerate() {
            let cell = |i: usize| row.get(i).unwrap_or(&EMPTY_CELL);

            let year = cell(index.year).to_year().ok_or_else(|| {
                LoadError::Parse(format!(
                    "row {}: '{}' is not a valid {}",
                    row_no + 1,
                    cell(index.year).to_label(),
                    YEAR_COLUMN
                ))
            })?;

            records.push(Record {
                name: cell(index.name).to_label(),
                graduation: cell(index.graduation).to_label(),
                year,
            });
        }

        Ok(Dataset {
            columns: headers,
            records,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
