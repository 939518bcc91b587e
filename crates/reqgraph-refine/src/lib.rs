pub mod engine;
mod error;
mod parse;
mod prompt;
pub mod pipeline;

pub use engine::{LlmExtractor, LlmRefiner};
pub use error::RefineError;
pub use parse::parse_summary;
pub use pipeline::{
    Extractor, Phase, Pipeline, ProgressSink, RefinementRequest, RefinementResult, Refiner,
};

use reqgraph_core::{AiSettings, SynthesisOptions};

/// Run the pipeline with default synthesis options.
///
/// Fails only when base extraction fails. A failed or malformed refinement
/// yields the base result with `was_refined == false`.
pub async fn run_pipeline(
    transcript: &str,
    extractor: &dyn Extractor,
    refiner: &dyn Refiner,
    progress: Option<&dyn ProgressSink>,
) -> Result<RefinementResult, RefineError> {
    Pipeline::default()
        .run(transcript, extractor, refiner, progress)
        .await
}

/// Extract and refine `transcript` with the LLM provider in `settings`.
pub async fn refine_transcript(
    transcript: &str,
    settings: &AiSettings,
    progress: Option<&dyn ProgressSink>,
) -> Result<RefinementResult, RefineError> {
    let extractor = LlmExtractor::new(settings.clone());
    let refiner = LlmRefiner::new(settings.clone());
    let pipeline = Pipeline::new(SynthesisOptions {
        score_threshold: settings.score_threshold,
        ..Default::default()
    });

    tracing::info!(
        provider = %settings.provider,
        model = %settings.model,
        refine_model = %settings.refinement_model(),
        "running refinement pipeline"
    );
    pipeline.run(transcript, &extractor, &refiner, progress).await
}
