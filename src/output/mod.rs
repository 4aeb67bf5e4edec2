mod styling;
mod tables;
mod views;

use serde::Serialize;

pub use styling::{dim, magenta_bold};
pub use views::{
    render_build, render_history, render_pipeline_detail, render_pipelines, render_trigger,
};

/// Prints the `jenkins-pulse` banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("📡 jenkins-pulse"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Jenkins Pipeline Status")
    );
}

/// Serialises any engine result as JSON.
pub fn render_json<T: Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}
