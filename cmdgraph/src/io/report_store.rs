//! Report output and schema-checked loading.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use jsonschema::validator_for;
use serde_json::Value;
use tracing::debug;

use crate::core::invariants::validate_report_invariants;
use crate::core::types::DependencyReport;
use crate::io::render::render_markdown;

const REPORT_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../schemas/report/v1.schema.json"
));

/// Output encoding for `cmdgraph resolve`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Pretty-printed JSON (machine readable, checked by `cmdgraph check`).
    #[default]
    Json,
    /// Markdown tables for humans.
    Markdown,
}

/// Encode `report` in `format`. JSON output ends with a newline.
pub fn render_report(report: &DependencyReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => {
            let mut buf = serde_json::to_string_pretty(report).context("serialize report")?;
            buf.push('\n');
            Ok(buf)
        }
        ReportFormat::Markdown => render_markdown(report),
    }
}

/// Write `report` to `path`, creating parent directories.
pub fn write_report(path: &Path, report: &DependencyReport, format: ReportFormat) -> Result<()> {
    let payload = render_report(report, format)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    fs::write(path, payload).with_context(|| format!("write report {}", path.display()))?;
    debug!(path = %path.display(), ?format, "report written");
    Ok(())
}

/// Load a JSON report and check it against the schema and invariants.
pub fn load_report(path: &Path) -> Result<DependencyReport> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read report {}", path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("parse report {}", path.display()))?;
    validate_schema(&value)?;
    let report: DependencyReport = serde_json::from_value(value)
        .with_context(|| format!("deserialize report {}", path.display()))?;
    let errors = validate_report_invariants(&report);
    if !errors.is_empty() {
        return Err(anyhow!("report invariants failed:\n- {}", errors.join("\n- ")));
    }
    Ok(report)
}

fn validate_schema(report: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(REPORT_SCHEMA).context("parse report schema")?;
    let compiled = validator_for(&schema).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(report) {
        let messages = compiled
            .iter_errors(report)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!(
            "report schema validation failed:\n- {}",
            messages.join("\n- ")
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::report::build_report;
    use crate::test_support::{Fixture, entry, phase_report};

    fn sample() -> DependencyReport {
        build_report(
            vec![phase_report(
                "01",
                vec![entry("ops:build", 0, true), entry("ops:lint", 1, false)],
                &["reviewer"],
            )],
            "2026-01-01T00:00:00Z".to_string(),
        )
    }

    #[test]
    fn written_report_loads_back() {
        let fixture = Fixture::new().expect("fixture");
        let path = fixture.root().join("out/report.json");
        write_report(&path, &sample(), ReportFormat::Json).expect("write");

        let contents = fs::read_to_string(&path).expect("read");
        assert!(contents.ends_with("}\n"));
        assert!(contents.contains("\"totalCommands\": 2"));
        assert_eq!(load_report(&path).expect("load"), sample());
    }

    #[test]
    fn schema_violations_are_reported() {
        let fixture = Fixture::new().expect("fixture");
        let path = fixture
            .write(
                "bad.json",
                r#"{"generatedAt": "x", "summary": {"phaseCount": 0, "agents": [],
                    "totalCommands": 0, "unresolvedCommands": 0},
                    "phases": [{"phase": "01", "name": "n", "agents": [], "totalCommands": 1,
                    "entries": [{"command": "nocolon", "depth": 0, "found": false,
                                 "confidence": "explicit", "path": "x.md"}]}]}"#,
            )
            .expect("write");
        let err = load_report(&path).unwrap_err();
        assert!(err.to_string().contains("schema validation failed"));
    }

    #[test]
    fn invariant_violations_are_reported() {
        let mut report = sample();
        report.phases[0].entries.reverse();
        let fixture = Fixture::new().expect("fixture");
        let path = fixture.root().join("unsorted.json");
        write_report(&path, &report, ReportFormat::Json).expect("write");

        let err = load_report(&path).unwrap_err();
        assert!(err.to_string().contains("must be sorted"));
    }

    #[test]
    fn markdown_format_is_rendered() {
        let rendered = render_report(&sample(), ReportFormat::Markdown).expect("render");
        assert!(rendered.contains("`ops:build`"));
    }
}
