//! Extract, diagnose, maybe refine.
//!
//! The base extraction is mandatory and its failure propagates. Refinement is
//! attempted only when diagnostics ask for it, and any failure there degrades
//! to the base result.

use async_trait::async_trait;
use serde::Serialize;

use reqgraph_core::{
    analyze_diagram, synthesize_graph, DiagnosticsReport, RequirementsSummary, SynthesisOptions,
};

use crate::error::RefineError;
use crate::parse;

/// Coarse progress phases, in the order a run passes through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Extracting,
    Diagnosing,
    Refining,
    Finalizing,
    Done,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Extracting => "Extracting requirements",
            Phase::Diagnosing => "Checking relationship graph",
            Phase::Refining => "Refining with a stronger model",
            Phase::Finalizing => "Building final graph",
            Phase::Done => "Done",
        }
    }

    pub fn percent(&self) -> u8 {
        match self {
            Phase::Extracting => 10,
            Phase::Diagnosing => 40,
            Phase::Refining => 60,
            Phase::Finalizing => 90,
            Phase::Done => 100,
        }
    }
}

/// Receives progress notifications. Purely informational.
pub trait ProgressSink: Send + Sync {
    fn report(&self, phase: Phase, percent: u8);
}

impl<F> ProgressSink for F
where
    F: Fn(Phase, u8) + Send + Sync,
{
    fn report(&self, phase: Phase, percent: u8) {
        self(phase, percent)
    }
}

/// Base extraction collaborator: transcript in, summary out.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, transcript: &str) -> Result<RequirementsSummary, RefineError>;
}

/// Everything the refinement collaborator gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct RefinementRequest<'a> {
    pub transcript: &'a str,
    pub base: &'a RequirementsSummary,
    pub diagnostics: &'a DiagnosticsReport,
    /// The diagram the diagnostics were computed from
    pub diagram: &'a str,
}

/// Refinement collaborator. Returns raw structured output; the pipeline
/// parses it so a malformed answer is handled like any other failure.
#[async_trait]
pub trait Refiner: Send + Sync {
    async fn refine(&self, request: RefinementRequest<'_>) -> Result<String, RefineError>;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinementResult {
    pub summary: RequirementsSummary,
    pub diagram: String,
    pub was_refined: bool,
    /// Diagnostics of the base pass, which decided whether to refine
    pub diagnostics: DiagnosticsReport,
    /// Diagnostics of the returned diagram
    pub final_diagnostics: DiagnosticsReport,
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pub options: SynthesisOptions,
}

impl Pipeline {
    pub fn new(options: SynthesisOptions) -> Self {
        Self { options }
    }

    pub async fn run(
        &self,
        transcript: &str,
        extractor: &dyn Extractor,
        refiner: &dyn Refiner,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<RefinementResult, RefineError> {
        let notify = |phase: Phase| {
            if let Some(sink) = progress {
                sink.report(phase, phase.percent());
            }
        };

        notify(Phase::Extracting);
        let base = extractor.extract(transcript).await?;
        tracing::info!(
            actors = base.actors.len(),
            modules = base.candidate_modules.len(),
            tools = base.current_tools.len(),
            "base extraction complete"
        );

        notify(Phase::Diagnosing);
        let base_diagram = match base.authored_diagram() {
            Some(d) => d.to_string(),
            None => synthesize_graph(&base, &self.options),
        };
        let diagnostics = analyze_diagram(&base, &base_diagram);

        if !diagnostics.needs_refinement() {
            tracing::info!("base graph is sound, skipping refinement");
            notify(Phase::Finalizing);
            let result = RefinementResult {
                summary: base,
                diagram: base_diagram,
                was_refined: false,
                final_diagnostics: diagnostics.clone(),
                diagnostics,
            };
            notify(Phase::Done);
            return Ok(result);
        }

        tracing::info!(
            orphan_actors = ?diagnostics.actors_with_no_connections,
            orphan_key_modules = ?diagnostics.key_modules_missing_or_orphaned,
            suspicious = diagnostics.suspicious_client_edges.len(),
            "graph has defects, refining"
        );

        notify(Phase::Refining);
        let request = RefinementRequest {
            transcript,
            base: &base,
            diagnostics: &diagnostics,
            diagram: &base_diagram,
        };
        let refined = match refiner.refine(request).await {
            Ok(raw) => parse::parse_summary(&raw),
            Err(e) => Err(e),
        };

        notify(Phase::Finalizing);
        let result = match refined {
            Ok(summary) => {
                let mut summary = summary.backfill_from(&base);
                // The authored diagram describes the pre-refinement summary
                summary.relationship_diagram = None;
                let diagram = synthesize_graph(&summary, &self.options);
                let final_diagnostics = analyze_diagram(&summary, &diagram);
                if final_diagnostics.needs_refinement() {
                    tracing::warn!(
                        orphan_actors = ?final_diagnostics.actors_with_no_connections,
                        orphan_key_modules = ?final_diagnostics.key_modules_missing_or_orphaned,
                        suspicious = final_diagnostics.suspicious_client_edges.len(),
                        "refined graph still has defects"
                    );
                } else {
                    tracing::info!("refinement resolved graph defects");
                }
                RefinementResult {
                    summary,
                    diagram,
                    was_refined: true,
                    diagnostics,
                    final_diagnostics,
                }
            }
            Err(e) => {
                tracing::warn!(
                    phase = "refine",
                    context = %fingerprint(&base.business_context),
                    actors = base.actors.len(),
                    modules = base.candidate_modules.len(),
                    error = %e,
                    "refinement failed, keeping base summary"
                );
                RefinementResult {
                    summary: base,
                    diagram: base_diagram,
                    was_refined: false,
                    final_diagnostics: diagnostics.clone(),
                    diagnostics,
                }
            }
        };

        notify(Phase::Done);
        Ok(result)
    }
}

/// First few words of the business context, enough to tell runs apart in logs.
fn fingerprint(context: &str) -> &str {
    match context.char_indices().nth(60) {
        Some((cut, _)) => &context[..cut],
        None => context,
    }
}
