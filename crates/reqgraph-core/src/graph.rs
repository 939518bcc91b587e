//! Relationship graph synthesis and its line-oriented diagram text.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::fallback::assign_fallback;
use crate::score::score;
use crate::text::{expand_role_keywords, normalize, overlaps};
use crate::{Actor, CandidateModule, RequirementsSummary};

pub const DEFAULT_SCORE_THRESHOLD: u8 = 2;

pub const DIAGRAM_HEADER: &str = "graph LR";

const EMPTY_LABEL: &str = "No actors or modules identified";
const NO_MODULES_LABEL: &str = "No modules identified";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Actor,
    Module,
    Tool,
    /// Explicit marker for missing input, never matched by diagnostics.
    Placeholder,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Actor to module, score at or above the threshold
    Scored,
    /// Actor to module, best-effort for an actor with no scored edge
    Fallback,
    /// Tool to module
    Integration,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisOptions {
    /// Minimum score for a scored edge
    pub score_threshold: u8,
    /// Skip scoring and connect every actor to every module. Debug aid.
    pub simple_mode: bool,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            simple_mode: false,
        }
    }
}

/// Build the graph for `summary` and render it as diagram text.
pub fn synthesize_graph(summary: &RequirementsSummary, options: &SynthesisOptions) -> String {
    build_graph(summary, options).render()
}

/// Build the relationship graph for `summary`.
///
/// Actors, modules and tools are visited in name order so the same summary
/// always yields the same graph.
pub fn build_graph(summary: &RequirementsSummary, options: &SynthesisOptions) -> Graph {
    let mut actors: Vec<&Actor> = summary.actors.iter().collect();
    actors.sort_by(|a, b| a.name.cmp(&b.name));
    actors.dedup_by(|a, b| a.name == b.name);
    let mut modules: Vec<&CandidateModule> = summary.candidate_modules.iter().collect();
    modules.sort_by(|a, b| a.name.cmp(&b.name));
    modules.dedup_by(|a, b| a.name == b.name);

    let dropped = summary.actors.len() + summary.candidate_modules.len() - actors.len() - modules.len();
    if dropped > 0 {
        tracing::debug!(dropped, "ignoring repeated actor or module names");
    }

    let mut graph = Graph::default();
    let mut ids = IdAllocator::default();

    if actors.is_empty() && modules.is_empty() {
        graph.push_node(&mut ids, NodeKind::Placeholder, EMPTY_LABEL);
        return graph;
    }

    let actor_ids: Vec<String> = actors
        .iter()
        .map(|a| graph.push_node(&mut ids, NodeKind::Actor, &a.name))
        .collect();
    let module_ids: Vec<String> = modules
        .iter()
        .map(|m| graph.push_node(&mut ids, NodeKind::Module, &m.name))
        .collect();

    if modules.is_empty() {
        graph.push_node(&mut ids, NodeKind::Placeholder, NO_MODULES_LABEL);
        return graph;
    }

    let desc_words: Vec<HashSet<String>> = modules.iter().map(|m| normalize(&m.description)).collect();
    let name_words: Vec<HashSet<String>> = modules.iter().map(|m| normalize(&m.name)).collect();

    let mut tools: Vec<&str> = summary.current_tools.iter().map(String::as_str).collect();
    tools.sort_unstable();
    tools.dedup();

    let mut integrations = Vec::new();
    for tool in tools {
        let tool_words = normalize(tool);
        let targets: Vec<usize> = (0..modules.len())
            .filter(|&i| overlaps(&tool_words, &desc_words[i]))
            .collect();
        if targets.is_empty() {
            continue;
        }
        let tool_id = graph.push_node(&mut ids, NodeKind::Tool, tool);
        integrations.extend(targets.into_iter().map(|i| GraphEdge {
            from: tool_id.clone(),
            to: module_ids[i].clone(),
            kind: EdgeKind::Integration,
            score: None,
        }));
    }

    for (actor, actor_id) in actors.iter().zip(&actor_ids) {
        if options.simple_mode {
            for module_id in &module_ids {
                graph.push_edge(actor_id, module_id, EdgeKind::Scored, None);
            }
            continue;
        }

        let keywords = expand_role_keywords(&actor.name);
        let scores: Vec<u8> = modules
            .iter()
            .enumerate()
            .map(|(i, m)| score(actor, m, summary, &keywords, &desc_words[i], &name_words[i]))
            .collect();

        let mut drawn = 0;
        for (i, &s) in scores.iter().enumerate() {
            if s >= options.score_threshold {
                graph.push_edge(actor_id, &module_ids[i], EdgeKind::Scored, Some(s));
                drawn += 1;
            }
        }

        if drawn == 0 {
            match assign_fallback(actor, &modules, &scores) {
                Some((i, s)) => {
                    tracing::debug!(actor = %actor.name, module = %modules[i].name, score = s, "fallback edge");
                    graph.push_edge(actor_id, &module_ids[i], EdgeKind::Fallback, Some(s));
                }
                None => {
                    tracing::debug!(actor = %actor.name, "no edge for actor");
                }
            }
        }
    }

    graph.edges.extend(integrations);

    tracing::debug!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        threshold = options.score_threshold,
        simple = options.simple_mode,
        "synthesized relationship graph"
    );

    graph
}

impl Graph {
    fn push_node(&mut self, ids: &mut IdAllocator, kind: NodeKind, label: &str) -> String {
        let id = ids.allocate(kind, label);
        self.nodes.push(GraphNode {
            id: id.clone(),
            label: label.to_string(),
            kind,
        });
        id
    }

    fn push_edge(&mut self, from: &str, to: &str, kind: EdgeKind, score: Option<u8>) {
        self.edges.push(GraphEdge {
            from: from.to_string(),
            to: to.to_string(),
            kind,
            score,
        });
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_by_label(&self, kind: NodeKind, label: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.kind == kind && n.label == label)
    }

    /// The edge from the actor labelled `actor` to the module labelled `module`, if drawn.
    pub fn actor_edge(&self, actor: &str, module: &str) -> Option<&GraphEdge> {
        let from = self.node_by_label(NodeKind::Actor, actor)?;
        let to = self.node_by_label(NodeKind::Module, module)?;
        self.edges.iter().find(|e| e.from == from.id && e.to == to.id)
    }

    /// Render as diagram text: header, node lines by section, then edge lines.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(64 + self.nodes.len() * 40 + self.edges.len() * 32);
        out.push_str(DIAGRAM_HEADER);
        out.push('\n');

        let sections = [
            (NodeKind::Actor, Some("Actors")),
            (NodeKind::Module, Some("Modules")),
            (NodeKind::Tool, Some("Tools")),
            (NodeKind::Placeholder, None),
        ];
        for (kind, heading) in sections {
            let mut nodes = self.nodes.iter().filter(|n| n.kind == kind).peekable();
            if nodes.peek().is_none() {
                continue;
            }
            if let Some(heading) = heading {
                out.push_str("    %% ");
                out.push_str(heading);
                out.push('\n');
            }
            for node in nodes {
                out.push_str("    ");
                out.push_str(&node.id);
                out.push_str("[\"");
                out.push_str(&escape_label(&node.label));
                out.push_str("\"]\n");
            }
        }

        let mut relationships = self
            .edges
            .iter()
            .filter(|e| e.kind != EdgeKind::Integration)
            .peekable();
        if relationships.peek().is_some() {
            out.push_str("    %% Relationships\n");
            for edge in relationships {
                render_edge(&mut out, edge);
            }
        }

        let mut integrations = self
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Integration)
            .peekable();
        if integrations.peek().is_some() {
            out.push_str("    %% Integrations\n");
            for edge in integrations {
                render_edge(&mut out, edge);
            }
        }

        out
    }
}

fn render_edge(out: &mut String, edge: &GraphEdge) {
    out.push_str("    ");
    out.push_str(&edge.from);
    out.push_str(match edge.kind {
        EdgeKind::Fallback => " -.-> ",
        EdgeKind::Scored | EdgeKind::Integration => " --> ",
    });
    out.push_str(&edge.to);
    out.push('\n');
}

pub(crate) fn escape_label(label: &str) -> String {
    label.replace('"', "#quot;")
}

pub(crate) fn unescape_label(label: &str) -> String {
    label.replace("#quot;", "\"")
}

/// Lowercase, drop everything but ASCII alphanumerics, underscores and
/// spaces, then turn spaces into underscores. Empty results become "node".
pub fn slugify(name: &str) -> String {
    let slug: String = name
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == ' ')
        .map(|c| if c == ' ' { '_' } else { c.to_ascii_lowercase() })
        .collect();
    if slug.is_empty() {
        "node".to_string()
    } else {
        slug
    }
}

/// Hands out one collision-free id per (kind, display name).
#[derive(Debug, Default)]
struct IdAllocator {
    used: HashSet<String>,
    assigned: HashMap<(NodeKind, String), String>,
}

impl IdAllocator {
    fn allocate(&mut self, kind: NodeKind, name: &str) -> String {
        if let Some(id) = self.assigned.get(&(kind, name.to_string())) {
            return id.clone();
        }

        let base = slugify(name);
        let mut id = base.clone();
        let mut suffix = 2;
        while self.used.contains(&id) {
            id = format!("{base}_{suffix}");
            suffix += 1;
        }

        self.used.insert(id.clone());
        self.assigned.insert((kind, name.to_string()), id.clone());
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Priority;
    use pretty_assertions::assert_eq;

    fn actor(name: &str) -> Actor {
        Actor {
            name: name.into(),
            description: String::new(),
        }
    }

    fn module(name: &str, description: &str, priority: Priority) -> CandidateModule {
        CandidateModule {
            name: name.into(),
            description: description.into(),
            priority,
        }
    }

    #[test]
    fn repeated_names_yield_one_node() {
        let summary = RequirementsSummary {
            actors: vec![actor("Owner"), actor("Owner")],
            candidate_modules: vec![
                module("Reporting Dashboard", "dashboard for owner with analytics", Priority::MustHave),
                module("Reporting Dashboard", "duplicate entry", Priority::NiceToHave),
            ],
            ..Default::default()
        };
        let graph = build_graph(&summary, &SynthesisOptions::default());
        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["owner", "reporting_dashboard"]);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].kind, EdgeKind::Scored);
    }

    #[test]
    fn slugify_rules() {
        assert_eq!(slugify("Client (Omnigo)"), "client_omnigo");
        assert_eq!(slugify("  Status_Tracker v2 "), "status_tracker_v2");
        assert_eq!(slugify("???"), "node");
        assert_eq!(slugify("Café Owner"), "caf_owner");
    }

    #[test]
    fn allocator_suffixes_collisions() {
        let mut ids = IdAllocator::default();
        assert_eq!(ids.allocate(NodeKind::Actor, "Owner"), "owner");
        assert_eq!(ids.allocate(NodeKind::Module, "owner"), "owner_2");
        assert_eq!(ids.allocate(NodeKind::Tool, "Owner!"), "owner_3");
        assert_eq!(ids.allocate(NodeKind::Actor, "Owner"), "owner");
        assert_eq!(ids.allocate(NodeKind::Actor, "owner 2"), "owner_2_2");
    }

    #[test]
    fn empty_summary_renders_placeholder_only() {
        let text = synthesize_graph(&RequirementsSummary::default(), &SynthesisOptions::default());
        assert_eq!(text, "graph LR\n    no_actors_or_modules_identified[\"No actors or modules identified\"]\n");
    }

    #[test]
    fn actors_without_modules_get_marker() {
        let summary = RequirementsSummary {
            actors: vec![actor("Owner"), actor("Consultant")],
            ..Default::default()
        };
        let graph = build_graph(&summary, &SynthesisOptions::default());
        assert!(graph.edges.is_empty());
        let kinds: Vec<NodeKind> = graph.nodes.iter().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![NodeKind::Actor, NodeKind::Actor, NodeKind::Placeholder]);
        assert_eq!(graph.nodes[0].label, "Consultant");
        assert_eq!(graph.nodes[2].label, "No modules identified");
    }

    #[test]
    fn renders_sections_and_edge_styles() {
        let summary = RequirementsSummary {
            actors: vec![actor("Owner"), actor("Office Staff")],
            candidate_modules: vec![
                module(
                    "Reporting Dashboard",
                    "dashboard for owner with analytics",
                    Priority::ShouldHave,
                ),
                module(
                    "Home",
                    "landing page replacing the shared Excel sheet",
                    Priority::NiceToHave,
                ),
            ],
            current_tools: vec!["Excel".into(), "Slack".into()],
            ..Default::default()
        };
        let text = synthesize_graph(&summary, &SynthesisOptions::default());
        let expected = "\
graph LR
    %% Actors
    office_staff[\"Office Staff\"]
    owner[\"Owner\"]
    %% Modules
    home[\"Home\"]
    reporting_dashboard[\"Reporting Dashboard\"]
    %% Tools
    excel[\"Excel\"]
    %% Relationships
    office_staff -.-> home
    owner --> reporting_dashboard
    %% Integrations
    excel --> home
";
        assert_eq!(text, expected);
    }

    #[test]
    fn simple_mode_is_full_bipartite() {
        let summary = RequirementsSummary {
            actors: vec![actor("A"), actor("B")],
            candidate_modules: vec![
                module("X", "", Priority::NiceToHave),
                module("Y", "", Priority::NiceToHave),
                module("Z", "", Priority::NiceToHave),
            ],
            ..Default::default()
        };
        let graph = build_graph(
            &summary,
            &SynthesisOptions {
                simple_mode: true,
                ..Default::default()
            },
        );
        assert_eq!(graph.edges.len(), 6);
        assert!(graph.edges.iter().all(|e| e.kind == EdgeKind::Scored));
    }

    #[test]
    fn quotes_in_labels_are_escaped() {
        let summary = RequirementsSummary {
            actors: vec![actor("The \"Boss\"")],
            ..Default::default()
        };
        let text = synthesize_graph(&summary, &SynthesisOptions::default());
        assert!(text.contains("the_boss[\"The #quot;Boss#quot;\"]"));
    }
}
