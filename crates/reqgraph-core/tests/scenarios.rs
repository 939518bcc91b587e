use pretty_assertions::assert_eq;
use reqgraph_core::{
    analyze_diagram, build_graph, synthesize_graph, Actor, ActorModuleEdge, CandidateModule,
    DiagnosticsReport, EdgeKind, NodeKind, Priority, RequirementsSummary, SynthesisOptions,
};

fn actor(name: &str, description: &str) -> Actor {
    Actor {
        name: name.into(),
        description: description.into(),
    }
}

fn module(name: &str, description: &str, priority: Priority) -> CandidateModule {
    CandidateModule {
        name: name.into(),
        description: description.into(),
        priority,
    }
}

fn invoicing_summary() -> RequirementsSummary {
    RequirementsSummary {
        business_context: "Small consultancy billing its clients".into(),
        actors: vec![
            actor("Consultant", "submits invoices"),
            actor("Owner", "reviews invoices, uses reporting dashboard"),
        ],
        candidate_modules: vec![
            module(
                "Invoice Portal",
                "portal for consultants to submit invoices",
                Priority::MustHave,
            ),
            module(
                "Reporting Dashboard",
                "dashboard for owner with analytics",
                Priority::ShouldHave,
            ),
        ],
        ..Default::default()
    }
}

#[test]
fn consultants_submit_and_owners_report() {
    let graph = build_graph(&invoicing_summary(), &SynthesisOptions::default());

    let submit = graph
        .actor_edge("Consultant", "Invoice Portal")
        .expect("consultant uses the portal");
    assert_eq!(submit.kind, EdgeKind::Scored);

    let report = graph
        .actor_edge("Owner", "Reporting Dashboard")
        .expect("owner uses the dashboard");
    assert_eq!(report.kind, EdgeKind::Scored);

    assert!(graph.actor_edge("Consultant", "Reporting Dashboard").is_none());
}

#[test]
fn invoicing_diagram_round_trips_clean() {
    let summary = invoicing_summary();
    let diagram = synthesize_graph(&summary, &SynthesisOptions::default());
    let report = analyze_diagram(&summary, &diagram);
    assert!(report.actors_with_no_connections.is_empty());
    assert!(report.key_modules_missing_or_orphaned.is_empty());
    assert!(!report.needs_refinement());
}

#[test]
fn client_reaching_internal_module_is_flagged() {
    let summary = RequirementsSummary {
        actors: vec![actor("Client (Omnigo)", "pays invoices")],
        candidate_modules: vec![module(
            "Automated Reminders",
            "sends payment reminders on a schedule",
            Priority::MustHave,
        )],
        ..Default::default()
    };

    // simple mode draws the edge regardless of score
    let diagram = synthesize_graph(
        &summary,
        &SynthesisOptions {
            simple_mode: true,
            ..Default::default()
        },
    );
    let report = analyze_diagram(&summary, &diagram);
    assert_eq!(
        report.suspicious_client_edges,
        vec![ActorModuleEdge {
            actor: "Client (Omnigo)".into(),
            module: "Automated Reminders".into(),
        }]
    );
    assert!(report.needs_refinement());

    // scored synthesis refuses to force the client onto it
    let graph = build_graph(&summary, &SynthesisOptions::default());
    assert!(graph.edges.is_empty());
    let report = analyze_diagram(&summary, &graph.render());
    assert!(report.suspicious_client_edges.is_empty());
    assert_eq!(report.actors_with_no_connections, vec!["Client (Omnigo)".to_string()]);
}

#[test]
fn empty_summary_yields_placeholder_and_clean_report() {
    let summary = RequirementsSummary::default();
    let graph = build_graph(&summary, &SynthesisOptions::default());
    assert_eq!(graph.nodes.len(), 1);
    assert_eq!(graph.nodes[0].kind, NodeKind::Placeholder);
    assert!(graph.edges.is_empty());

    let diagram = graph.render();
    assert_eq!(analyze_diagram(&summary, &diagram), DiagnosticsReport::default());
}

#[test]
fn tools_integrate_with_modules_that_mention_them() {
    let mut summary = invoicing_summary();
    summary.current_tools = vec!["QuickBooks".into(), "Excel".into(), "Gmail".into()];
    summary.candidate_modules.push(module(
        "Accounting Sync",
        "pushes approved invoices into quickbooks",
        Priority::ShouldHave,
    ));

    let graph = build_graph(&summary, &SynthesisOptions::default());
    let tools: Vec<&str> = graph
        .nodes
        .iter()
        .filter(|n| n.kind == NodeKind::Tool)
        .map(|n| n.label.as_str())
        .collect();
    assert_eq!(tools, vec!["QuickBooks"]);

    let integrations: Vec<(&str, &str)> = graph
        .edges
        .iter()
        .filter(|e| e.kind == EdgeKind::Integration)
        .map(|e| (e.from.as_str(), e.to.as_str()))
        .collect();
    assert_eq!(integrations, vec![("quickbooks", "accounting_sync")]);

    // integration edges always come last
    let first_integration = graph
        .edges
        .iter()
        .position(|e| e.kind == EdgeKind::Integration)
        .unwrap();
    assert!(graph.edges[first_integration..]
        .iter()
        .all(|e| e.kind == EdgeKind::Integration));
}

#[test]
fn actor_input_order_does_not_matter() {
    let summary = invoicing_summary();
    let mut reversed = summary.clone();
    reversed.actors.reverse();
    reversed.candidate_modules.reverse();

    let options = SynthesisOptions::default();
    assert_eq!(synthesize_graph(&summary, &options), synthesize_graph(&reversed, &options));
}

#[test]
fn co_manager_reaches_dashboard() {
    let summary = RequirementsSummary {
        actors: vec![
            actor("Owner", "runs the business"),
            actor("Wife", "helps with the books"),
        ],
        candidate_modules: vec![module(
            "Status Dashboard",
            "overview of invoice status for the wife and owner",
            Priority::MustHave,
        )],
        ..Default::default()
    };
    let graph = build_graph(&summary, &SynthesisOptions::default());
    let edge = graph.actor_edge("Wife", "Status Dashboard").expect("edge");
    // strong "wife" (+2), must-have (+1), co-manager affinity (+1)
    assert_eq!(edge.score, Some(4));
}

#[test]
fn summary_json_round_trip_keeps_camel_case() {
    let summary = invoicing_summary();
    let json = serde_json::to_value(&summary).unwrap();
    assert!(json.get("candidateModules").is_some());
    assert_eq!(json["candidateModules"][0]["priority"], "must-have");
    let back: RequirementsSummary = serde_json::from_value(json).unwrap();
    assert_eq!(back, summary);
}
