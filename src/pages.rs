use handlebars::{Handlebars, RenderError, TemplateError};
use serde_json::json;

use crate::chart::RenderResult;

const INDEX: &str = "index";
const OUTPUT: &str = "output";
const NO_FILE: &str = "nofileprovided";
const INVALID_FILE: &str = "invalidfile";
const PARSE_ERROR: &str = "parseerror";

/// The HTML pages served by the application, compiled once at startup
pub struct Pages {
    registry: Handlebars<'static>,
}

impl Pages {
    /// Compiles the embedded templates
    ///
    /// # Errors
    /// Fails only if one of the templates bundled into the binary is malformed.
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.register_partial("head", include_str!("./templates/layout_head.html"))?;
        registry.register_template_string(INDEX, include_str!("./templates/index.html"))?;
        registry.register_template_string(OUTPUT, include_str!("./templates/output.html"))?;
        registry.register_template_string(NO_FILE, include_str!("./templates/nofileprovided.html"))?;
        registry
            .register_template_string(INVALID_FILE, include_str!("./templates/invalidfile.html"))?;
        registry.register_template_string(PARSE_ERROR, include_str!("./templates/parseerror.html"))?;
        Ok(Self { registry })
    }

    /// Upload form
    pub fn index(&self) -> Result<String, RenderError> {
        self.registry.render(INDEX, &json!({}))
    }

    /// Results page embedding both charts and the table unescaped
    pub fn output(&self, result: &RenderResult) -> Result<String, RenderError> {
        self.registry.render(OUTPUT, result)
    }

    pub fn no_file(&self) -> Result<String, RenderError> {
        self.registry.render(NO_FILE, &json!({}))
    }

    pub fn invalid_file(&self, extension: &str) -> Result<String, RenderError> {
        self.registry
            .render(INVALID_FILE, &json!({ "extension": extension }))
    }

    pub fn parse_error(&self, message: &str) -> Result<String, RenderError> {
        self.registry
            .render(PARSE_ERROR, &json!({ "message": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_has_upload_form() {
        let html = Pages::new().unwrap().index().unwrap();
        assert!(html.contains("action=\"/process_data\""));
        assert!(html.contains("enctype=\"multipart/form-data\""));
        assert!(html.contains("name=\"data_file\""));
        assert!(html.contains("name=\"graduation_filter\""));
        assert!(html.contains("name=\"current_year_filter\""));
        assert!(html.contains("<title>Visualize the data</title>"));
    }

    #[test]
    fn output_embeds_fragments_raw() {
        let result = RenderResult {
            bar_plot_div: "<div id=\"bar\"></div>".into(),
            pie_plot_div: "<div id=\"pie\"></div>".into(),
            graduation_table: "<table></table>".into(),
        };
        let html = Pages::new().unwrap().output(&result).unwrap();
        assert!(html.contains("<div id=\"bar\"></div>"));
        assert!(html.contains("<div id=\"pie\"></div>"));
        assert!(html.contains("<table></table>"));
    }

    #[test]
    fn error_pages_escape_their_input() {
        let pages = Pages::new().unwrap();
        assert!(pages.no_file().unwrap().contains("No file provided"));
        assert!(pages.invalid_file("txt").unwrap().contains(".txt"));

        let html = pages.parse_error("bad <cell>").unwrap();
        assert!(html.contains("bad &lt;cell&gt;"));
    }
}
