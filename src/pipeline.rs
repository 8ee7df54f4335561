use thiserror::Error;

use crate::chart::{ChartError, ChartRenderer, RenderResult};
use crate::filter::{FilterSpec, filter};
use crate::loader::{self, LoadError};

/// Every way a single upload can fail
///
/// All variants are terminal for the request; nothing is retried and no
/// partial result is returned.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The request carried no `data_file` field at all
    #[error("No file provided.")]
    MissingFile,

    /// The `data_file` field was present but no file was chosen
    #[error("no file was selected")]
    EmptyFilename,

    #[error("unsupported file extension: '{0}'")]
    UnsupportedFormat(String),

    #[error("could not parse file: {0}")]
    Parse(String),

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error(transparent)]
    Render(#[from] ChartError),

    /// The multipart body itself could not be read
    #[error("malformed upload: {0}")]
    Multipart(String),
}

impl From<LoadError> for ProcessError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::UnsupportedFormat(ext) => ProcessError::UnsupportedFormat(ext),
            LoadError::Parse(msg) => ProcessError::Parse(msg),
            LoadError::MissingColumn(col) => ProcessError::MissingColumn(col),
        }
    }
}

/// An uploaded file as received from the form
#[derive(Clone, Debug, Default)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// Load, filter and render, without any HTTP involved
///
/// The steps run in a fixed order and the first failure ends the run:
/// missing upload, empty filename, unsupported extension, decode, render.
#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    renderer: ChartRenderer,
}

impl Pipeline {
    pub fn new(renderer: ChartRenderer) -> Self {
        Self { renderer }
    }

    pub fn run(
        &self,
        upload: Option<Upload>,
        spec: &FilterSpec,
    ) -> Result<RenderResult, ProcessError> {
        let upload = upload.ok_or(ProcessError::MissingFile)?;
        if upload.filename.is_empty() {
            return Err(ProcessError::EmptyFilename);
        }

        let dataset = loader::load(&upload.bytes, &upload.filename)?;

        let filtered = filter(&dataset, spec);
        log::info!(
            "processed '{}': {} rows, {} after filtering (graduation={}, year={})",
            upload.filename,
            dataset.len(),
            filtered.len(),
            spec.graduation_filter,
            spec.current_year_filter
        );

        Ok(self.renderer.render(&filtered)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "name,graduation,year\nA,2023,2021\nB,2024,2022\nC,2023,2021\n";

    fn spec(graduation: &str, year: i64) -> FilterSpec {
        FilterSpec {
            graduation_filter: graduation.to_string(),
            current_year_filter: year,
        }
    }

    #[test]
    fn missing_upload() {
        let err = Pipeline::default().run(None, &FilterSpec::default()).unwrap_err();
        assert!(matches!(err, ProcessError::MissingFile));
    }

    #[test]
    fn empty_filename() {
        let upload = Upload::new("", SAMPLE_CSV);
        let err = Pipeline::default()
            .run(Some(upload), &FilterSpec::default())
            .unwrap_err();
        assert!(matches!(err, ProcessError::EmptyFilename));
    }

    #[test]
    fn unsupported_extension() {
        let upload = Upload::new("data.txt", SAMPLE_CSV);
        let err = Pipeline::default()
            .run(Some(upload), &FilterSpec::default())
            .unwrap_err();
        assert!(matches!(err, ProcessError::UnsupportedFormat(ext) if ext == "txt"));
    }

    #[test]
    fn missing_column_is_reported() {
        let upload = Upload::new("data.csv", "name,year\nA,2021\n");
        let err = Pipeline::default()
            .run(Some(upload), &FilterSpec::default())
            .unwrap_err();
        assert!(matches!(err, ProcessError::MissingColumn(c) if c == "graduation"));
    }

    #[test]
    fn filters_before_rendering() {
        let upload = Upload::new("data.csv", SAMPLE_CSV);
        let result = Pipeline::default()
            .run(Some(upload), &spec("2023", 0))
            .unwrap();

        assert_eq!(result.graduation_table.matches("<tr>").count(), 2);
        assert!(result.graduation_table.contains("<td>A</td>"));
        assert!(result.graduation_table.contains("<td>C</td>"));
        assert!(!result.graduation_table.contains("<td>B</td>"));
        assert!(result.pie_plot_div.contains("2023 (2)"));
        assert!(!result.pie_plot_div.contains("2024 (1)"));
    }

    #[test]
    fn no_matches_still_renders() {
        let upload = Upload::new("data.csv", SAMPLE_CSV);
        let result = Pipeline::default()
            .run(Some(upload), &spec("all", 1999))
            .unwrap();
        assert!(!result.graduation_table.contains("<td>"));
    }
}
