/*!
# Data Visualizer

A small web application that turns an uploaded CSV or spreadsheet into a
bar chart, a donut chart and an HTML table.

## Overview

A user uploads a file with at least the columns `name`, `graduation` and
`year`, optionally narrows it down by graduation and by year, and gets back
a page with the charts and the matching rows.

## Architecture

Each request runs one straight pipeline and shares nothing with other requests:

### Tabular Loader
- Dispatches on the filename extension (`.csv`, `.xls`, `.xlsx`, any case)
- CSV through the `csv` crate, spreadsheets through `calamine`
- Validates the required columns and coerces `year` to an integer up front

### Filter Engine
- `graduation_filter`: exact match, `"all"` disables it
- `current_year_filter`: numeric match, `0` disables it
- Keeps row order, never touches the header

### Chart Renderer
- "Current Year by Name" bar chart, one bar per row
- "Graduation Distribution" donut chart, one slice per distinct graduation
- Three column data table without an index column
- Charts are drawn with `plotters` as inline SVG

### Request Handler
- Collects the multipart form, runs the pipeline, picks the page
- Every failure is terminal for the request and maps to its own page

## Modules

- **record**: typed rows and the dataset they live in
- **loader**: upload decoding
- **filter**: row predicates
- **chart**: chart and table markup
- **pipeline**: load, filter and render without HTTP
- **pages**: handlebars templates
- **config**: command line and environment settings
- **app**: routing and response composition

## Routes

- `GET /` - Upload form
- `POST /process_data` - Upload, filter and visualize
- `GET /static/{file}` - Stylesheet
*/

pub mod filter;
pub mod loader;
pub mod record;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod chart;
#[cfg(feature = "web")]
pub mod config;
#[cfg(feature = "web")]
pub mod pages;
#[cfg(feature = "web")]
pub mod pipeline;

pub use filter::*;
pub use loader::*;
pub use record::*;
