use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use reqgraph_core::{
    analyze_diagram, build_graph, read_settings, synthesize_graph, RequirementsSummary,
    SynthesisOptions,
};
use reqgraph_refine::{Phase, ProgressSink};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

// --- Request types ---

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct SynthesizeRequest {
    /// The requirements summary as a JSON string (businessContext, actors, candidateModules, currentTools, painPoints, primaryGoals, ...). Missing or null collections are treated as empty.
    summary: String,
    /// Minimum relevance score for an actor-module edge. Default: the configured scoreThreshold (2).
    score_threshold: Option<u8>,
    /// Connect every actor to every module without scoring. Debug aid.
    simple_mode: Option<bool>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct AnalyzeRequest {
    /// The requirements summary as a JSON string
    summary: String,
    /// Diagram text to check, e.g. a hand-written `graph LR` diagram. Default: the diagram synthesize_graph would build for this summary.
    diagram: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct RunPipelineRequest {
    /// Interview transcript or meeting notes to extract requirements from
    transcript: String,
}

// --- Server ---

#[derive(Clone)]
pub struct ReqgraphServer {
    tool_router: ToolRouter<Self>,
}

fn parse_summary_arg(raw: &str) -> Result<RequirementsSummary, CallToolResult> {
    serde_json::from_str(raw).map_err(|e| {
        CallToolResult::error(vec![Content::text(format!("Invalid summary JSON: {}", e))])
    })
}

fn json_result<T: serde::Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

#[tool_router]
impl ReqgraphServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Build the actor/module/tool relationship graph for a requirements summary. Returns the diagram text (`graph LR`, nodes as id[\"Label\"], scored edges `-->`, fallback edges `-.->`) followed by the structural diagnostics of that diagram."
    )]
    fn synthesize_graph(
        &self,
        Parameters(req): Parameters<SynthesizeRequest>,
    ) -> Result<CallToolResult, McpError> {
        let summary = match parse_summary_arg(&req.summary) {
            Ok(s) => s,
            Err(result) => return Ok(result),
        };
        let options = SynthesisOptions {
            score_threshold: req
                .score_threshold
                .unwrap_or_else(|| read_settings().score_threshold),
            simple_mode: req.simple_mode.unwrap_or(false),
        };

        let graph = build_graph(&summary, &options);
        let diagram = graph.render();
        let report = analyze_diagram(&summary, &diagram);
        tracing::info!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            needs_refinement = report.needs_refinement(),
            "synthesized graph"
        );

        let result = serde_json::json!({
            "diagram": diagram,
            "diagnostics": report,
            "needsRefinement": report.needs_refinement(),
        });
        json_result(&result)
    }

    #[tool(
        description = "Check a diagram against a requirements summary. Reports actors with no connections, modules with no connections, client-type actors reaching internal modules, key modules (invoice portal, status tracking, reporting, dashboards) that are missing or orphaned, and fallback edges."
    )]
    fn analyze_diagram(
        &self,
        Parameters(req): Parameters<AnalyzeRequest>,
    ) -> Result<CallToolResult, McpError> {
        let summary = match parse_summary_arg(&req.summary) {
            Ok(s) => s,
            Err(result) => return Ok(result),
        };
        let diagram = match req.diagram.filter(|d| !d.trim().is_empty()) {
            Some(d) => d,
            None => {
                let options = SynthesisOptions {
                    score_threshold: read_settings().score_threshold,
                    ..Default::default()
                };
                synthesize_graph(&summary, &options)
            }
        };
        let report = analyze_diagram(&summary, &diagram);
        let result = serde_json::json!({
            "diagnostics": report,
            "needsRefinement": report.needs_refinement(),
            "clean": report.is_clean(),
        });
        json_result(&result)
    }

    #[tool(
        description = "Extract a requirements summary from a transcript with the configured LLM provider (~/.reqgraph/settings.json), diagnose its relationship graph, and refine it with the stronger model when the graph has defects. Returns summary, diagram, wasRefined, diagnostics and finalDiagnostics."
    )]
    async fn run_pipeline(
        &self,
        Parameters(req): Parameters<RunPipelineRequest>,
    ) -> Result<CallToolResult, McpError> {
        let settings = read_settings();
        let log_progress = |phase: Phase, percent: u8| {
            tracing::info!(percent, "{}", phase.label());
        };
        let progress: &dyn ProgressSink = &log_progress;

        match reqgraph_refine::refine_transcript(&req.transcript, &settings, Some(progress)).await {
            Ok(result) => json_result(&result),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Extraction failed: {}",
                e
            ))])),
        }
    }

    #[tool(description = "Get the stopwords, role synonyms, keyword tables and key-module patterns that drive scoring and diagnostics")]
    fn get_scoring_tables(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(
            reqgraph_core::rules::describe_tables(),
        )]))
    }
}

#[tool_handler]
impl ServerHandler for ReqgraphServer {
    fn get_info(&self) -> ServerInfo {
        let instructions = format!(
            "{}\n\n## Extraction Rules\n{}",
            INSTRUCTIONS,
            reqgraph_core::rules::EXTRACTION_RULES
        );
        ServerInfo {
            instructions: Some(instructions.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

const INSTRUCTIONS: &str = r#"This server turns requirements summaries into actor/module relationship graphs and checks them for structural defects.

Typical workflow:
1. Write or extract a requirements summary (JSON with actors, candidateModules, currentTools, painPoints, goals).
2. Call `synthesize_graph` to get the diagram and its diagnostics.
3. If `needsRefinement` is true, fix the summary: sharpen module descriptions so they name who uses them, add the module an orphaned actor actually needs, keep client-type actors on portals and client views.
4. Call `synthesize_graph` again until the diagnostics are clean.

Diagram dialect:
- Header `graph LR`; `%%` lines are comments.
- Nodes are declared as `id["Label"]`; a quote inside a label is written `#quot;`.
- `actor --> module` is a scored relationship, `actor -.-> module` a fallback link drawn only because the actor had nothing better, `tool --> module` an integration with a tool already in use.
- `==>` and `|label|` segments are accepted when checking hand-written diagrams.

Use `run_pipeline` to do extraction and refinement in one call with the configured LLM provider. Use `analyze_diagram` to check a diagram you wrote by hand."#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let service = ReqgraphServer::new()
        .serve(rmcp::transport::io::stdio())
        .await
        .inspect_err(|e| tracing::error!(error = %e, "MCP server error"))?;
    service.waiting().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_summary_json_is_a_tool_error() {
        let result = parse_summary_arg("{not json").unwrap_err();
        assert_eq!(result.is_error, Some(true));
    }

    #[test]
    fn instructions_match_integration_direction() {
        let summary: RequirementsSummary = serde_json::from_str(
            r#"{
                "actors": [{"name": "Owner"}],
                "candidateModules": [{"name": "Accounting Sync", "description": "pushes invoices into quickbooks"}],
                "currentTools": ["QuickBooks"]
            }"#,
        )
        .unwrap();
        let graph = build_graph(&summary, &SynthesisOptions::default());
        let integration = graph
            .edges
            .iter()
            .find(|e| e.kind == reqgraph_core::EdgeKind::Integration)
            .unwrap();
        assert_eq!(graph.node(&integration.from).unwrap().label, "QuickBooks");
        assert!(INSTRUCTIONS.contains("`tool --> module` an integration"));
    }

    #[test]
    fn synthesize_returns_diagram_and_diagnostics() {
        let server = ReqgraphServer::new();
        let summary = r#"{
            "actors": [{"name": "Consultant", "description": "submits invoices"}],
            "candidateModules": [{"name": "Invoice Portal", "description": "portal for consultants to submit invoices", "priority": "must-have"}]
        }"#;
        let result = server
            .synthesize_graph(Parameters(SynthesizeRequest {
                summary: summary.into(),
                score_threshold: Some(2),
                simple_mode: None,
            }))
            .unwrap();
        assert_eq!(result.is_error, Some(false));
        let text = serde_json::to_string(&result.content).unwrap();
        assert!(text.contains("graph LR"));
        assert!(text.contains("needsRefinement"));
    }
}
