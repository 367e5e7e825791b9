//! Orchestration for `cmdgraph resolve`.
//!
//! Builds the immutable resolver state from configuration, reads every phase
//! document up front, traverses each phase independently, and assembles the
//! final report in phase declaration order.

use std::thread;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info, instrument};

use crate::core::extract::{ExtractOptions, Extractor};
use crate::core::report::{build_phase_report, build_report};
use crate::core::traverse::traverse;
use crate::core::types::{DependencyReport, PhaseReport};
use crate::io::config::ResolverConfig;
use crate::io::locator::{CommandLocator, SearchRoot};
use crate::io::phases::{PhaseDocument, load_phases};

/// Immutable per-run resolver state, shared by reference with every phase.
#[derive(Debug)]
pub struct Resolver {
    locator: CommandLocator,
    extract: ExtractOptions,
    max_depth: u32,
    parallel: bool,
}

impl Resolver {
    /// Validate `cfg` and build the alias table and search roots.
    pub fn from_config(cfg: &ResolverConfig) -> Result<Self> {
        cfg.validate()?;
        let aliases = cfg.alias_table().context("load alias table")?;
        let roots = cfg.search_roots.iter().map(SearchRoot::from).collect();
        debug!(
            roots = cfg.search_roots.len(),
            aliases = aliases.len(),
            max_depth = cfg.max_depth,
            parallel = cfg.parallel,
            "resolver configured"
        );
        Ok(Self {
            locator: CommandLocator::new(roots, aliases),
            extract: cfg.extract_options(),
            max_depth: cfg.max_depth,
            parallel: cfg.parallel,
        })
    }

    pub fn locator(&self) -> &CommandLocator {
        &self.locator
    }

    pub fn extractor(&self) -> Extractor<'_> {
        Extractor::new(self.locator.aliases(), self.extract)
    }

    /// Traverse one phase from the references in its root document.
    #[instrument(skip_all, fields(phase = %phase.id))]
    pub fn resolve_phase(&self, phase: &PhaseDocument) -> PhaseReport {
        let extractor = self.extractor();
        let root = extractor.extract(&phase.body);
        let traversal = traverse(&self.locator, &extractor, &root, self.max_depth);
        let report = build_phase_report(&phase.id, &phase.name, &traversal);
        info!(
            path = %phase.path.display(),
            entry_points = root.commands.len(),
            commands = report.total_commands,
            unresolved = report.entries.iter().filter(|entry| !entry.found).count(),
            agents = report.agents.len(),
            "phase resolved"
        );
        report
    }

    /// Resolve every phase, preserving declaration order.
    pub fn resolve_phases(&self, phases: &[PhaseDocument]) -> Result<Vec<PhaseReport>> {
        if !self.parallel || phases.len() < 2 {
            return Ok(phases.iter().map(|phase| self.resolve_phase(phase)).collect());
        }
        thread::scope(|scope| {
            let handles: Vec<_> = phases
                .iter()
                .map(|phase| scope.spawn(move || self.resolve_phase(phase)))
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .map_err(|_| anyhow!("phase worker thread panicked"))
                })
                .collect()
        })
    }
}

/// Resolve all configured phases into a report stamped with `generated_at`.
///
/// Configuration problems (invalid config, malformed aliases, missing phase
/// files) are returned before any traversal starts.
pub fn resolve(cfg: &ResolverConfig, generated_at: String) -> Result<DependencyReport> {
    let resolver = Resolver::from_config(cfg)?;
    let phases = load_phases(&cfg.phases).context("load phases")?;
    let reports = resolver.resolve_phases(&phases)?;
    debug!(
        phases = reports.len(),
        cached_documents = resolver.locator().cache().len(),
        "all phases resolved"
    );
    Ok(build_report(reports, generated_at))
}

/// RFC 3339 timestamp for the report.
///
/// `source_date_epoch` is the value of `SOURCE_DATE_EPOCH`, when set; it pins
/// the timestamp so repeated runs produce identical bytes.
pub fn generation_timestamp(source_date_epoch: Option<&str>) -> Result<String> {
    let at = match source_date_epoch {
        Some(raw) => {
            let secs: i64 = raw
                .trim()
                .parse()
                .with_context(|| format!("SOURCE_DATE_EPOCH must be an integer (got '{raw}')"))?;
            DateTime::<Utc>::from_timestamp(secs, 0)
                .ok_or_else(|| anyhow!("SOURCE_DATE_EPOCH out of range: {secs}"))?
        }
        None => Utc::now(),
    };
    Ok(at.to_rfc3339_opts(SecondsFormat::Secs, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::config::{PhaseConfig, SearchRootConfig};
    use crate::test_support::Fixture;

    const STAMP: &str = "2026-01-01T00:00:00Z";

    fn config(fixture: &Fixture, phases: &[&str]) -> ResolverConfig {
        ResolverConfig {
            search_roots: vec![SearchRootConfig::new(fixture.root().join("plugins"))],
            phases: phases
                .iter()
                .map(|id| PhaseConfig {
                    id: id.to_string(),
                    name: None,
                    path: fixture.root().join(format!("phases/{id}.md")),
                })
                .collect(),
            ..ResolverConfig::default()
        }
    }

    fn sample_project(fixture: &Fixture) {
        fixture
            .write("phases/01.md", "# Foundation\n\n/core:setup\n/core:lint\n")
            .expect("phase 01");
        fixture
            .write("phases/02.md", "# Build\n\n/core:build @agent-builder\n")
            .expect("phase 02");
        fixture
            .command("plugins", "core:setup", "/core:deps\nsubagent_type: \"installer\"")
            .expect("setup");
        fixture.command("plugins", "core:deps", "").expect("deps");
        fixture
            .command("plugins", "core:build", "/core:setup /core:compile")
            .expect("build");
    }

    #[test]
    fn resolves_phases_in_declaration_order() {
        let fixture = Fixture::new().expect("fixture");
        sample_project(&fixture);

        let report = resolve(&config(&fixture, &["02", "01"]), STAMP.to_string()).expect("resolve");

        let ids: Vec<&str> = report.phases.iter().map(|p| p.phase.as_str()).collect();
        assert_eq!(ids, vec!["02", "01"]);
        assert_eq!(report.phases[1].name, "Foundation");

        let build: Vec<(String, u32, bool)> = report.phases[0]
            .entries
            .iter()
            .map(|e| (e.command.to_string(), e.depth, e.found))
            .collect();
        assert_eq!(
            build,
            vec![
                ("core:build".to_string(), 0, true),
                ("core:compile".to_string(), 1, false),
                ("core:setup".to_string(), 1, true),
                ("core:deps".to_string(), 2, true),
            ]
        );
        let agents: Vec<&str> = report.summary.agents.iter().map(|a| a.as_str()).collect();
        assert_eq!(agents, vec!["builder", "installer"]);
        assert_eq!(report.summary.unresolved_commands, 2);
    }

    #[test]
    fn root_document_agents_are_listed_first() {
        let fixture = Fixture::new().expect("fixture");
        sample_project(&fixture);
        let report = resolve(&config(&fixture, &["02"]), STAMP.to_string()).expect("resolve");
        let agents: Vec<&str> = report.phases[0].agents.iter().map(|a| a.as_str()).collect();
        assert_eq!(agents, vec!["builder", "installer"]);
        let summary: Vec<&str> = report.summary.agents.iter().map(|a| a.as_str()).collect();
        assert_eq!(summary, vec!["builder", "installer"]);
    }

    #[test]
    fn parallel_matches_sequential() {
        let fixture = Fixture::new().expect("fixture");
        sample_project(&fixture);
        let sequential = config(&fixture, &["01", "02"]);
        let parallel = ResolverConfig {
            parallel: true,
            ..sequential.clone()
        };

        let a = resolve(&sequential, STAMP.to_string()).expect("sequential");
        let b = resolve(&parallel, STAMP.to_string()).expect("parallel");
        assert_eq!(a, b);
    }

    #[test]
    fn missing_phase_file_fails_before_traversal() {
        let fixture = Fixture::new().expect("fixture");
        sample_project(&fixture);
        let err = resolve(&config(&fixture, &["01", "03"]), STAMP.to_string()).unwrap_err();
        assert!(format!("{err:#}").contains("missing file"));
    }

    #[test]
    fn empty_phase_yields_empty_report() {
        let fixture = Fixture::new().expect("fixture");
        fixture.write("phases/01.md", "Nothing to do.\n").expect("phase");
        let report = resolve(&config(&fixture, &["01"]), STAMP.to_string()).expect("resolve");
        assert_eq!(report.phases[0].total_commands, 0);
        assert_eq!(report.phases[0].name, "01");
    }

    #[test]
    fn timestamp_honours_source_date_epoch() {
        assert_eq!(
            generation_timestamp(Some("1767225600")).expect("stamp"),
            "2026-01-01T00:00:00Z"
        );
        assert!(generation_timestamp(Some("soon")).is_err());
        let now = generation_timestamp(None).expect("now");
        assert!(now.ends_with('Z'));
    }

    #[test]
    fn resolver_rejects_invalid_config() {
        let err = Resolver::from_config(&ResolverConfig::default()).unwrap_err();
        assert!(err.to_string().contains("no search roots"));
    }
}
