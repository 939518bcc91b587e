use reqgraph_core::rules::EXTRACTION_RULES;
use reqgraph_core::{DiagnosticsReport, Frequency, Impact, Priority, RequirementsSummary};

use crate::pipeline::RefinementRequest;

fn priority_str(priority: Priority) -> &'static str {
    match priority {
        Priority::MustHave => "must-have",
        Priority::ShouldHave => "should-have",
        Priority::NiceToHave => "nice-to-have",
    }
}

fn impact_str(impact: Impact) -> &'static str {
    match impact {
        Impact::Low => "low",
        Impact::Medium => "medium",
        Impact::High => "high",
    }
}

fn frequency_str(frequency: Frequency) -> &'static str {
    match frequency {
        Frequency::Rare => "rare",
        Frequency::Sometimes => "sometimes",
        Frequency::Often => "often",
        Frequency::Constant => "constant",
    }
}

fn push_described(out: &mut String, prefix: &str, name: &str, description: &str) {
    out.push_str(prefix);
    out.push_str(" \"");
    out.push_str(name);
    out.push('"');
    if !description.is_empty() {
        out.push_str(" | \"");
        // Truncate long descriptions
        match description.char_indices().nth(120) {
            Some((cut, _)) => {
                out.push_str(&description[..cut]);
                out.push_str("...");
            }
            None => out.push_str(description),
        }
        out.push('"');
    }
    out.push('\n');
}

fn push_list(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push_str(title);
    out.push_str(":\n");
    for item in items {
        out.push_str("  - ");
        out.push_str(item);
        out.push('\n');
    }
}

/// Convert a summary to a compact text representation for LLM consumption.
pub fn serialize_summary(summary: &RequirementsSummary) -> String {
    let mut out = String::with_capacity(2048);

    if !summary.business_context.is_empty() {
        out.push_str("CONTEXT: ");
        out.push_str(&summary.business_context);
        out.push('\n');
    }
    push_list(&mut out, "PRIMARY GOALS", &summary.primary_goals);
    push_list(&mut out, "SECONDARY GOALS", &summary.secondary_goals);

    out.push_str("ACTORS:\n");
    for actor in &summary.actors {
        push_described(&mut out, "[A]", &actor.name, &actor.description);
    }

    out.push_str("MODULES:\n");
    for module in &summary.candidate_modules {
        let prefix = format!("[M {}]", priority_str(module.priority));
        push_described(&mut out, &prefix, &module.name, &module.description);
    }

    push_list(&mut out, "TOOLS", &summary.current_tools);

    if !summary.pain_points.is_empty() {
        out.push_str("PAIN POINTS:\n");
        for pain in &summary.pain_points {
            out.push_str("  [");
            out.push_str(impact_str(pain.impact));
            out.push('/');
            out.push_str(frequency_str(pain.frequency));
            out.push_str("] ");
            out.push_str(&pain.description);
            out.push('\n');
        }
    }

    push_list(&mut out, "NON-FUNCTIONAL", &summary.non_functional_requirements);
    push_list(&mut out, "RISKS", &summary.risks);
    push_list(&mut out, "OPEN QUESTIONS", &summary.open_questions);

    if !summary.uploaded_documents.is_empty() {
        out.push_str("DOCUMENTS:\n");
        for doc in &summary.uploaded_documents {
            out.push_str("  - ");
            out.push_str(&doc.filename);
            if let Some(s) = &doc.summary {
                out.push_str(": ");
                out.push_str(s);
            }
            out.push('\n');
        }
    }

    out
}

/// List the defects the refinement pass has to fix.
pub fn serialize_diagnostics(report: &DiagnosticsReport) -> String {
    let mut out = String::new();

    for actor in &report.actors_with_no_connections {
        out.push_str(&format!("- Actor \"{actor}\" uses no module.\n"));
    }
    for module in &report.key_modules_missing_or_orphaned {
        out.push_str(&format!("- Key module \"{module}\" has no actor using it.\n"));
    }
    for edge in &report.suspicious_client_edges {
        out.push_str(&format!(
            "- Client-type actor \"{}\" reaches internal module \"{}\".\n",
            edge.actor, edge.module
        ));
    }
    for module in &report.modules_with_no_connections {
        if !report.key_modules_missing_or_orphaned.contains(module) {
            out.push_str(&format!("- Module \"{module}\" has no connections (minor).\n"));
        }
    }
    for edge in &report.fallback_edges {
        out.push_str(&format!(
            "- \"{}\" was only weakly linked to \"{}\" (minor).\n",
            edge.actor, edge.module
        ));
    }

    if out.is_empty() {
        out.push_str("- No structural defects found.\n");
    }
    out
}

fn summary_schema() -> String {
    let schema = schemars::schema_for!(RequirementsSummary);
    serde_json::to_string(&schema).unwrap_or_default()
}

pub fn extraction_system_prompt() -> String {
    format!(
        "You are a requirements analyst. Read the interview transcript and extract a structured \
requirements summary: business context, goals, actors, candidate modules, tools in use, pain \
points, non-functional requirements, risks and open questions.\n\n\
Only record what the transcript supports. Do not invent actors or modules the client never \
mentioned; put uncertainty into openQuestions instead.\n\n\
## Extraction Rules\n{}\n\n\
Output ONLY a JSON object matching this schema:\n{}\n\n\
Output ONLY the JSON object, nothing else.",
        EXTRACTION_RULES,
        summary_schema()
    )
}

pub fn extraction_user_message(transcript: &str) -> String {
    format!("TRANSCRIPT:\n{transcript}")
}

pub fn refinement_system_prompt() -> String {
    format!(
        "You are a senior requirements analyst reviewing a first-pass extraction. A relationship \
graph built from the summary shows structural defects. Fix them by adjusting the summary: \
clarify module descriptions so they name the actors who use them, add a missing module when \
an actor genuinely has nothing to use, re-scope client-facing access so clients only reach \
portals and client views, and make sure every key module has a user.\n\n\
Do NOT:\n\
- Drop fields, documents, risks or open questions that are still valid\n\
- Rename actors or modules unless the name is the defect\n\
- Add actors or modules the transcript does not support\n\n\
## Extraction Rules\n{}\n\n\
Output ONLY the complete corrected summary as a JSON object matching this schema:\n{}\n\n\
Output ONLY the JSON object, nothing else.",
        EXTRACTION_RULES,
        summary_schema()
    )
}

pub fn refinement_user_message(request: &RefinementRequest<'_>) -> String {
    let mut out = String::with_capacity(4096 + request.transcript.len());
    out.push_str("DEFECTS:\n");
    out.push_str(&serialize_diagnostics(request.diagnostics));
    out.push_str("\nCURRENT SUMMARY:\n");
    out.push_str(&serialize_summary(request.base));
    out.push_str("\nCURRENT GRAPH:\n");
    out.push_str(request.diagram);
    if !request.diagram.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("\nCURRENT SUMMARY JSON:\n");
    out.push_str(&serde_json::to_string(request.base).unwrap_or_default());
    out.push_str("\n\nTRANSCRIPT:\n");
    out.push_str(request.transcript);
    out
}
