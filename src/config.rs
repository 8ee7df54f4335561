use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::chart::ChartOptions;

/// Runtime settings for the web server
///
/// Every flag can also be set through the environment variable named next to it.
#[derive(Clone, Debug, Parser)]
#[command(name = "website", about = "Upload a CSV or spreadsheet and chart it")]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "DATAVIS_ADDR", default_value = "127.0.0.1:3000")]
    pub addr: SocketAddr,

    /// Largest accepted request body, in bytes
    #[arg(long, env = "DATAVIS_MAX_UPLOAD_BYTES", default_value_t = 10 * 1024 * 1024)]
    pub max_upload_bytes: usize,

    /// Directory served under /static
    #[arg(long, env = "DATAVIS_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Chart width in pixels
    #[arg(long, env = "DATAVIS_CHART_WIDTH", default_value_t = 800)]
    pub chart_width: u32,

    /// Chart height in pixels
    #[arg(long, env = "DATAVIS_CHART_HEIGHT", default_value_t = 500)]
    pub chart_height: u32,
}

impl ServerConfig {
    pub fn chart_options(&self) -> ChartOptions {
        ChartOptions {
            width: self.chart_width,
            height: self.chart_height,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            max_upload_bytes: 10 * 1024 * 1024,
            static_dir: PathBuf::from("static"),
            chart_width: 800,
            chart_height: 500,
        }
    }
}
