use plotters::element::Pie;
use plotters::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::record::{Dataset, GRADUATION_COLUMN, NAME_COLUMN, YEAR_COLUMN};

pub const BAR_TITLE: &str = "Current Year by Name";
pub const BAR_X_LABEL: &str = "Name";
pub const BAR_Y_LABEL: &str = "Current Year";
pub const PIE_TITLE: &str = "Graduation Distribution";

/// Inner hole of the donut as a fraction of the pie radius
pub const DONUT_HOLE: f64 = 0.3;

const BAR_COLOR: RGBColor = RGBColor(99, 110, 250);

const PIE_COLORS: [RGBColor; 10] = [
    RGBColor(99, 110, 250),
    RGBColor(239, 85, 59),
    RGBColor(0, 204, 150),
    RGBColor(171, 99, 250),
    RGBColor(255, 161, 90),
    RGBColor(25, 211, 243),
    RGBColor(255, 102, 146),
    RGBColor(182, 232, 128),
    RGBColor(255, 151, 255),
    RGBColor(254, 203, 82),
];

/// Failure while drawing a chart
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("chart rendering failed: {0}")]
    Render(String),
}

/// Size of the generated charts
#[derive(Clone, Debug)]
pub struct ChartOptions {
    /// Width of each chart in pixels
    pub width: u32,

    /// Height of each chart in pixels
    pub height: u32,
}

impl Default for ChartOptions {
    /// 800x500, roughly the size of an embedded plot in a two column page
    fn default() -> Self {
        Self {
            width: 800,
            height: 500,
        }
    }
}

/// The three markup fragments embedded in the output page
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RenderResult {
    pub bar_plot_div: String,
    pub pie_plot_div: String,
    pub graduation_table: String,
}

/// Turns a filtered dataset into embeddable chart and table markup
///
/// Rendering never mutates the dataset, and an empty dataset produces
/// empty charts rather than an error.
#[derive(Clone, Debug, Default)]
pub struct ChartRenderer {
    options: ChartOptions,
}

impl ChartRenderer {
    pub fn new(options: ChartOptions) -> Self {
        Self { options }
    }

    /// Renders the bar chart, the pie chart and the table in one go
    pub fn render(&self, dataset: &Dataset) -> Result<RenderResult, ChartError> {
        Ok(RenderResult {
            bar_plot_div: self.render_bar(dataset)?,
            pie_plot_div: self.render_pie(dataset)?,
            graduation_table: self.render_table(dataset),
        })
    }

    /// Bar chart of `year` per `name`, one bar per record in dataset order
    pub fn render_bar(&self, dataset: &Dataset) -> Result<String, ChartError> {
        let svg = draw_bar_chart(&bar_series(dataset), &self.options)
            .map_err(|e| ChartError::Render(e.to_string()))?;
        Ok(format!("<div class=\"chart bar-chart\">{svg}</div>"))
    }

    /// Donut chart with one slice per distinct `graduation`
    pub fn render_pie(&self, dataset: &Dataset) -> Result<String, ChartError> {
        let svg = draw_pie_chart(&graduation_counts(dataset), &self.options)
            .map_err(|e| ChartError::Render(e.to_string()))?;
        Ok(format!("<div class=\"chart pie-chart\">{svg}</div>"))
    }

    /// HTML table of the `name`, `graduation` and `year` columns, without an index column
    pub fn render_table(&self, dataset: &Dataset) -> String {
        let mut html = String::from("<table border=\"1\" class=\"dataframe\">\n");
        html.push_str("  <thead>\n    <tr style=\"text-align: right;\">\n");
        for column in [NAME_COLUMN, GRADUATION_COLUMN, YEAR_COLUMN] {
            html.push_str(&format!("      <th>{column}</th>\n"));
        }
        html.push_str("    </tr>\n  </thead>\n  <tbody>\n");

        for record in &dataset.records {
            html.push_str("    <tr>\n");
            html.push_str(&format!(
                "      <td>{}</td>\n",
                handlebars::html_escape(&record.name)
            ));
            html.push_str(&format!(
                "      <td>{}</td>\n",
                handlebars::html_escape(&record.graduation)
            ));
            html.push_str(&format!("      <td>{}</td>\n", record.year));
            html.push_str("    </tr>\n");
        }

        html.push_str("  </tbody>\n</table>");
        html
    }
}

/// The (name, year) pairs plotted by the bar chart, in dataset order
///
/// Names are neither sorted nor deduplicated.
pub fn bar_series(dataset: &Dataset) -> Vec<(String, i64)> {
    dataset
        .records
        .iter()
        .map(|r| (r.name.clone(), r.year))
        .collect()
}

/// Counts records per distinct graduation
///
/// Slices are ordered by descending count; ties keep the order in which
/// the graduation first appears.
pub fn graduation_counts(dataset: &Dataset) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for record in &dataset.records {
        match counts.iter_mut().find(|(g, _)| *g == record.graduation) {
            Some((_, n)) => *n += 1,
            None => counts.push((record.graduation.clone(), 1)),
        }
    }
    // stable, so first-seen order survives among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

fn draw_bar_chart(
    series: &[(String, i64)],
    options: &ChartOptions,
) -> Result<String, Box<dyn std::error::Error>> {
    // A categorical axis needs at least one segment even with no data
    let segments = series.len().max(1) as i32;
    // f64 axis so years near i64::MAX neither overflow the headroom nor the tick stepping
    let max_year = series.iter().map(|(_, y)| *y).max().unwrap_or(0).max(0) as f64;
    let y_top = max_year * 1.1 + 1.0;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(BAR_TITLE, ("sans-serif", 24).into_font())
            .margin(10)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d((0..segments).into_segmented(), 0f64..y_top)?;

        let name_of = |v: &SegmentValue<i32>| match v {
            SegmentValue::CenterOf(i) => series
                .get(*i as usize)
                .map(|(name, _)| name.clone())
                .unwrap_or_default(),
            _ => String::new(),
        };

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(segments as usize + 1)
            .x_label_formatter(&name_of)
            .y_label_formatter(&|y| format!("{y:.0}"))
            .x_desc(BAR_X_LABEL)
            .y_desc(BAR_Y_LABEL)
            .draw()?;

        chart.draw_series(series.iter().enumerate().map(|(i, (_, year))| {
            let i = i as i32;
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *year as f64)],
                BAR_COLOR.filled(),
            );
            bar.set_margin(0, 0, 5, 5);
            bar
        }))?;

        root.present()?;
    }

    Ok(svg)
}

fn draw_pie_chart(
    counts: &[(String, usize)],
    options: &ChartOptions,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE)?;
        let area = root.titled(PIE_TITLE, ("sans-serif", 24).into_font())?;

        if !counts.is_empty() {
            let (width, height) = area.dim_in_pixel();
            let center = ((width / 2) as i32, (height / 2) as i32);
            let radius = f64::from(width.min(height)) * 0.35;

            let sizes: Vec<f64> = counts.iter().map(|(_, n)| *n as f64).collect();
            let colors: Vec<RGBColor> = (0..counts.len())
                .map(|i| PIE_COLORS[i % PIE_COLORS.len()])
                .collect();
            let labels: Vec<String> = counts.iter().map(|(g, n)| format!("{g} ({n})")).collect();

            let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
            pie.donut_hole(radius * DONUT_HOLE);
            pie.label_style(("sans-serif", 14).into_font().color(&BLACK));
            area.draw(&pie)?;
        }

        root.present()?;
    }

    Ok(svg)
}
