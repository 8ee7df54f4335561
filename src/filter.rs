use crate::record::{Dataset, Record};

/// Sentinel graduation value that disables the graduation predicate
pub const ALL_GRADUATIONS: &str = "all";

/// The pair of optional equality predicates supplied by the upload form
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterSpec {
    /// Exact, case-sensitive graduation to keep, or `"all"`
    pub graduation_filter: String,

    /// Year to keep; `0` keeps every year
    pub current_year_filter: i64,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            graduation_filter: ALL_GRADUATIONS.to_string(),
            current_year_filter: 0,
        }
    }
}

impl FilterSpec {
    /// Builds a spec from raw form values
    ///
    /// A missing or blank graduation means `"all"`. A missing, blank or
    /// non-integer year means `0`.
    pub fn from_form(graduation: Option<&str>, current_year: Option<&str>) -> Self {
        // An untouched text box submits "", which would otherwise hide every row
        let graduation_filter = match graduation {
            Some(g) if !g.trim().is_empty() => g.to_string(),
            _ => ALL_GRADUATIONS.to_string(),
        };
        let current_year_filter = current_year
            .and_then(|y| y.trim().parse::<i64>().ok())
            .unwrap_or(0);

        Self {
            graduation_filter,
            current_year_filter,
        }
    }

    fn matches(&self, record: &Record) -> bool {
        let graduation_ok =
            self.graduation_filter == ALL_GRADUATIONS || record.graduation == self.graduation_filter;
        let year_ok = self.current_year_filter == 0 || record.year == self.current_year_filter;
        graduation_ok && year_ok
    }
}

/// Returns the records of `dataset` that pass every active predicate
///
/// Order is preserved and the header row is carried over unchanged. An
/// empty result is not an error.
pub fn filter(dataset: &Dataset, spec: &FilterSpec) -> Dataset {
    Dataset {
        columns: dataset.columns.clone(),
        records: dataset
            .records
            .iter()
            .filter(|record| spec.matches(record))
            .cloned()
            .collect(),
    }
}
