use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir};

use crate::chart::{ChartRenderer, RenderResult};
use crate::config::ServerConfig;
use crate::filter::FilterSpec;
use crate::pages::Pages;
use crate::pipeline::{Pipeline, ProcessError, Upload};

const FILE_FIELD: &str = "data_file";
const GRADUATION_FIELD: &str = "graduation_filter";
const YEAR_FIELD: &str = "current_year_filter";

/// Everything a request needs, built once and shared read-only
pub struct AppState {
    pipeline: Pipeline,
    pages: Pages,
}

impl AppState {
    pub fn new(pipeline: Pipeline, pages: Pages) -> Self {
        Self { pipeline, pages }
    }
}

/// Raw form fields, collected before anything is validated
#[derive(Default)]
struct UploadForm {
    upload: Option<Upload>,
    graduation_filter: Option<String>,
    current_year_filter: Option<String>,
}

pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(ChartRenderer::new(config.chart_options()));
    let app_state = Arc::new(AppState::new(pipeline, Pages::new()?));

    let app = router(app_state, &config);

    let listener = TcpListener::bind(config.addr).await?;
    log::info!("Listening on http://{}", config.addr);
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/process_data", post(process_data))
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes))
        .with_state(state)
}

async fn serve_index(State(state): State<Arc<AppState>>) -> Response {
    match state.pages.index() {
        Ok(html) => Html(html).into_response(),
        Err(e) => template_failure(e),
    }
}

async fn process_data(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    // A body that is not multipart at all cannot carry a file field
    let form = match multipart {
        Ok(multipart) => read_form(multipart).await,
        Err(rejection) => {
            log::debug!("request is not multipart: {rejection}");
            Ok(UploadForm::default())
        }
    };

    let result = form.and_then(|form| {
        let spec = FilterSpec::from_form(
            form.graduation_filter.as_deref(),
            form.current_year_filter.as_deref(),
        );
        state.pipeline.run(form.upload, &spec)
    });

    respond(&state.pages, result)
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ProcessError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ProcessError::Multipart(e.to_string()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            FILE_FIELD => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ProcessError::Multipart(e.to_string()))?;
                form.upload = Some(Upload::new(filename, bytes.to_vec()));
            }
            GRADUATION_FIELD => {
                form.graduation_filter = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ProcessError::Multipart(e.to_string()))?,
                );
            }
            YEAR_FIELD => {
                form.current_year_filter = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ProcessError::Multipart(e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Turns the pipeline outcome into exactly one response
fn respond(pages: &Pages, result: Result<RenderResult, ProcessError>) -> Response {
    let err = match result {
        Ok(rendered) => {
            return match pages.output(&rendered) {
                Ok(html) => Html(html).into_response(),
                Err(e) => template_failure(e),
            };
        }
        Err(err) => err,
    };

    let status = status_for(&err);
    if status.is_server_error() {
        log::error!("request failed: {err}");
    } else {
        log::warn!("rejected upload: {err}");
    }

    let page = match &err {
        ProcessError::MissingFile => {
            return (status, format!("Error: {err}")).into_response();
        }
        ProcessError::Multipart(_) => {
            return (status, format!("Error: {err}")).into_response();
        }
        ProcessError::EmptyFilename => pages.no_file(),
        ProcessError::UnsupportedFormat(ext) => pages.invalid_file(ext),
        ProcessError::Parse(_) | ProcessError::MissingColumn(_) => {
            pages.parse_error(&err.to_string())
        }
        ProcessError::Render(_) => pages.parse_error("The charts could not be drawn."),
    };

    match page {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => template_failure(e),
    }
}

fn status_for(err: &ProcessError) -> StatusCode {
    match err {
        ProcessError::MissingFile | ProcessError::EmptyFilename | ProcessError::Multipart(_) => {
            StatusCode::BAD_REQUEST
        }
        ProcessError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        ProcessError::Parse(_) | ProcessError::MissingColumn(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ProcessError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn template_failure(err: handlebars::RenderError) -> Response {
    log::error!("page rendering failed: {err}");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_statuses() {
        assert_eq!(status_for(&ProcessError::MissingFile), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&ProcessError::EmptyFilename), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&ProcessError::UnsupportedFormat("txt".into())),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            status_for(&ProcessError::MissingColumn("year".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn missing_file_is_plain_text() {
        let pages = Pages::new().unwrap();
        let response = respond(&pages, Err(ProcessError::MissingFile));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let content_type = response.headers()["content-type"].to_str().unwrap();
        assert!(content_type.starts_with("text/plain"));
    }
}
