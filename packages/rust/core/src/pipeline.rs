//! End-to-end conversion: manifests → sources → resolve → convert → write.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use bmadconv_artifacts::serializer_for;
use bmadconv_manifest::load_manifests;
use bmadconv_shared::{AppConfig, ConverterError, FlavorOptions, OutputArtifact, Result, Target};

use crate::assembler::{self, RunManifest};
use crate::convert::convert_entity;
use crate::loader::load_sources;
use crate::resolver::ReferenceResolver;

/// Inputs of one conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// The `_bmad` directory holding `_config/` and the module trees.
    pub source_dir: PathBuf,
    /// Directory the flavor root is created in.
    pub output_dir: PathBuf,
    pub target: Target,
    /// Report one line per loaded and written entity.
    pub verbose: bool,
    pub flavor: FlavorOptions,
}

impl From<&AppConfig> for ConvertOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            source_dir: PathBuf::from(&config.defaults.source_dir),
            output_dir: PathBuf::from(&config.defaults.output_dir),
            target: config.defaults.target,
            verbose: false,
            flavor: FlavorOptions::from(config),
        }
    }
}

/// Outcome of a run. Per-entity failures land in `warnings`/`errors`
/// instead of aborting the run.
#[derive(Debug, Clone, Default)]
pub struct ConversionSummary {
    pub directive_count: usize,
    pub document_count: usize,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    /// `{output_dir}/{flavor root}`.
    pub output_root: PathBuf,
    pub elapsed: Duration,
}

impl ConversionSummary {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// One line per loaded or written entity; only called in verbose mode.
    fn detail(&self, line: &str);
    /// Called when the pipeline completes.
    fn done(&self, summary: &ConversionSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn detail(&self, _line: &str) {}
    fn done(&self, _summary: &ConversionSummary) {}
}

/// Run a full conversion.
///
/// 1. Read the manifest tables
/// 2. Load every source file they name
/// 3. Build the reference lookup from all workflows and tasks
/// 4. Convert each entity and write it through the target's serializer
/// 5. Write the run manifest
///
/// `Err` is returned only when the output root cannot be created.
#[instrument(skip_all, fields(source = %options.source_dir.display(), target = %options.target))]
pub fn convert(
    options: &ConvertOptions,
    progress: &dyn ProgressReporter,
) -> Result<ConversionSummary> {
    let start = Instant::now();
    let mut summary = ConversionSummary {
        output_root: options.output_dir.join(options.target.root_dir()),
        ..ConversionSummary::default()
    };

    info!(output = %summary.output_root.display(), "starting conversion");

    // --- Phase 1: Manifests ---
    progress.phase("Reading manifests");
    let manifests = match load_manifests(&options.source_dir) {
        Ok(m) => m,
        Err(e) => {
            warn!(error = %e, "conversion aborted before any output");
            summary.errors.push(e.to_string());
            summary.elapsed = start.elapsed();
            progress.done(&summary);
            return Ok(summary);
        }
    };
    summary.warnings.extend(manifests.warnings.iter().cloned());
    summary.errors.extend(manifests.errors.iter().cloned());

    // --- Phase 2: Sources ---
    progress.phase("Loading sources");
    let (sources, failures) = load_sources(&options.source_dir, &manifests, |kind, name| {
        if options.verbose {
            progress.detail(&format!("loaded {} {name}", kind.as_str()));
        }
    });
    record_failures(&mut summary, failures);

    // --- Phase 3: Reference lookup ---
    progress.phase("Resolving references");
    let resolver = ReferenceResolver::new(&sources.workflows, &sources.tasks);

    // --- Phase 4: Convert and write ---
    progress.phase("Writing files");
    assembler::prepare_root(&summary.output_root)?;

    let serializer = serializer_for(options.target, &options.flavor);
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut records = Vec::new();

    for entity in sources.into_entities() {
        for artifact in convert_entity(&entity, &resolver) {
            let file = serializer.render(&artifact);

            if !seen.insert(file.relative_path.clone()) {
                let msg = format!(
                    "{} already written this run; skipping {} '{}'",
                    file.relative_path.display(),
                    entity_kind(&artifact),
                    entity.name()
                );
                warn!("{msg}");
                summary.warnings.push(msg);
                continue;
            }

            match assembler::write_file(&summary.output_root, &file.relative_path, &file.content) {
                Ok(record) => {
                    match artifact {
                        OutputArtifact::Directive(_) => summary.directive_count += 1,
                        OutputArtifact::Document(_) => summary.document_count += 1,
                    }
                    if options.verbose {
                        progress.detail(&format!("wrote {}", record.path));
                    }
                    records.push(record);
                }
                Err(e) => {
                    warn!(error = %e, "write failed");
                    summary.errors.push(e.to_string());
                }
            }
        }
    }

    // --- Phase 5: Run manifest ---
    let manifest = RunManifest::new(options.target, &options.source_dir, records);
    if let Err(e) = assembler::write_run_manifest(&summary.output_root, &manifest) {
        summary.errors.push(e.to_string());
    }

    summary.elapsed = start.elapsed();
    progress.done(&summary);

    info!(
        directives = summary.directive_count,
        documents = summary.document_count,
        warnings = summary.warnings.len(),
        errors = summary.errors.len(),
        elapsed_ms = summary.elapsed.as_millis(),
        "conversion complete"
    );

    Ok(summary)
}

/// Missing files are warnings; everything else is an error.
fn record_failures(summary: &mut ConversionSummary, failures: Vec<ConverterError>) {
    for failure in failures {
        if failure.is_warning() {
            debug!(error = %failure, "source skipped");
            summary.warnings.push(failure.to_string());
        } else {
            warn!(error = %failure, "source failed");
            summary.errors.push(failure.to_string());
        }
    }
}

fn entity_kind(artifact: &OutputArtifact) -> &'static str {
    match artifact {
        OutputArtifact::Directive(_) => "agent",
        OutputArtifact::Document(d) => d.kind.as_str(),
    }
}
