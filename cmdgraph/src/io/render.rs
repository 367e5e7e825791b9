//! Markdown rendering of a dependency report.

use anyhow::{Context, Result};
use minijinja::{Environment, Value, context};

use crate::core::types::DependencyReport;

const REPORT_TEMPLATE: &str = include_str!("../templates/report.md");

/// Render `report` as a Markdown document.
pub fn render_markdown(report: &DependencyReport) -> Result<String> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_template("report", REPORT_TEMPLATE)
        .context("load report template")?;
    let template = env.get_template("report").context("get report template")?;
    let rendered = template
        .render(context! { report => Value::from_serialize(report) })
        .context("render report template")?;
    Ok(rendered)
}
