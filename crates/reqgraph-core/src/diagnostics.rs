//! Structural defect scan over diagram text.
//!
//! The diagram may come from [`crate::synthesize_graph`] or from an external
//! generator, so this is a tolerant line scanner rather than a parser: lines
//! that match neither the node grammar (`id["Label"]`) nor the edge grammar
//! (`a --> b`, `a -.-> b`, `a ==> b`, optionally `-->|label|`) contribute
//! nothing. `%%` comment lines are skipped.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::graph::unescape_label;
use crate::rules::{CLIENT_FACING_KEYWORDS, KEY_MODULE_PATTERNS};
use crate::text::is_client_type;
use crate::RequirementsSummary;

static NODE_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z0-9_]+)\[(?:"([^"]*)"|([^\]"]*))\]"#).expect("node declaration pattern")
});

static ARROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*(-->|-\.->|==>)(?:\s*\|[^|]*\|)?\s*").expect("arrow pattern")
});

static ENDPOINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^([A-Za-z0-9_]+)\s*(?:\[(?:"[^"]*"|[^\]"]*)\])?\s*;?$"#).expect("endpoint pattern")
});

static KEY_MODULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    KEY_MODULE_PATTERNS
        .iter()
        .filter_map(|(_, pattern)| Regex::new(pattern).ok())
        .collect()
});

/// An actor-to-module connection, by display name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActorModuleEdge {
    pub actor: String,
    pub module: String,
}

/// Structural defects found in one diagram. List order follows the summary
/// (or the diagram, for edges) but carries no meaning.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsReport {
    #[serde(default)]
    pub actors_with_no_connections: Vec<String>,
    #[serde(default)]
    pub modules_with_no_connections: Vec<String>,
    /// Client-type actors reaching modules that are not client-facing
    #[serde(default)]
    pub suspicious_client_edges: Vec<ActorModuleEdge>,
    #[serde(default)]
    pub key_modules_missing_or_orphaned: Vec<String>,
    /// Connections drawn only as fallback (dotted) edges. Informational.
    #[serde(default)]
    pub fallback_edges: Vec<ActorModuleEdge>,
}

impl DiagnosticsReport {
    /// Orphaned actors, orphaned key modules or suspicious client edges.
    /// Unused non-key modules alone are tolerated.
    pub fn needs_refinement(&self) -> bool {
        !self.actors_with_no_connections.is_empty()
            || !self.key_modules_missing_or_orphaned.is_empty()
            || !self.suspicious_client_edges.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.needs_refinement()
            && self.modules_with_no_connections.is_empty()
            && self.fallback_edges.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedEdge {
    from: String,
    to: String,
    dotted: bool,
}

#[derive(Debug, Default)]
struct ParsedDiagram {
    labels: HashMap<String, String>,
    edges: Vec<ParsedEdge>,
}

impl ParsedDiagram {
    fn label_of<'a>(&'a self, id: &'a str) -> &'a str {
        self.labels.get(id).map(String::as_str).unwrap_or(id)
    }
}

fn parse_diagram(diagram: &str) -> ParsedDiagram {
    let mut parsed = ParsedDiagram::default();

    for line in diagram.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("%%") {
            continue;
        }

        for caps in NODE_DECL.captures_iter(line) {
            let label = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| unescape_label(m.as_str().trim()))
                .unwrap_or_default();
            parsed.labels.insert(caps[1].to_string(), label);
        }

        parsed.edges.extend(scan_edges(line));
    }

    parsed
}

/// Split a line on arrows and pair up consecutive endpoints, so chains like
/// `a --> b --> c` yield two edges. A segment that is not an endpoint breaks
/// the chain at that point.
fn scan_edges(line: &str) -> Vec<ParsedEdge> {
    let arrows: Vec<(usize, usize, bool)> = ARROW
        .captures_iter(line)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let dotted = caps.get(1)?.as_str() == "-.->";
            Some((whole.start(), whole.end(), dotted))
        })
        .collect();
    if arrows.is_empty() {
        return vec![];
    }

    let mut segments = Vec::with_capacity(arrows.len() + 1);
    let mut start = 0;
    for &(s, e, _) in &arrows {
        segments.push(&line[start..s]);
        start = e;
    }
    segments.push(&line[start..]);

    let endpoint = |segment: &str| -> Option<String> {
        ENDPOINT
            .captures(segment.trim())
            .map(|caps| caps[1].to_string())
    };

    segments
        .windows(2)
        .zip(&arrows)
        .filter_map(|(pair, &(_, _, dotted))| {
            Some(ParsedEdge {
                from: endpoint(pair[0])?,
                to: endpoint(pair[1])?,
                dotted,
            })
        })
        .collect()
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn is_client_facing(module_name: &str) -> bool {
    let name = module_name.to_lowercase();
    CLIENT_FACING_KEYWORDS.iter().any(|k| name.contains(k))
}

fn is_key_module(module_name: &str) -> bool {
    KEY_MODULES.iter().any(|re| re.is_match(module_name))
}

/// Parse `diagram` and report structural defects against `summary`.
///
/// Never fails: no actors, no modules or a blank diagram yield an empty report.
pub fn analyze_diagram(summary: &RequirementsSummary, diagram: &str) -> DiagnosticsReport {
    let actors = &summary.actors;
    let modules = &summary.candidate_modules;
    if actors.is_empty() || modules.is_empty() || diagram.trim().is_empty() {
        return DiagnosticsReport::default();
    }

    // Names equal up to case share a key; an edge counts for all of them.
    let mut actor_index: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, a) in actors.iter().enumerate() {
        actor_index.entry(name_key(&a.name)).or_default().push(i);
    }
    let mut module_index: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, m) in modules.iter().enumerate() {
        module_index.entry(name_key(&m.name)).or_default().push(i);
    }

    let parsed = parse_diagram(diagram);

    let mut actor_counts = vec![0usize; actors.len()];
    let mut module_counts = vec![0usize; modules.len()];
    let mut report = DiagnosticsReport::default();

    for edge in &parsed.edges {
        let from = name_key(parsed.label_of(&edge.from));
        let to = name_key(parsed.label_of(&edge.to));

        for label in [&from, &to] {
            for &i in actor_index.get(label).into_iter().flatten() {
                actor_counts[i] += 1;
            }
            for &i in module_index.get(label).into_iter().flatten() {
                module_counts[i] += 1;
            }
        }

        let (Some(&ai), Some(&mi)) = (
            actor_index.get(&from).and_then(|v| v.first()),
            module_index.get(&to).and_then(|v| v.first()),
        ) else {
            continue;
        };
        let pair = ActorModuleEdge {
            actor: actors[ai].name.clone(),
            module: modules[mi].name.clone(),
        };

        if is_client_type(&pair.actor)
            && !is_client_facing(&pair.module)
            && !report.suspicious_client_edges.contains(&pair)
        {
            report.suspicious_client_edges.push(pair.clone());
        }
        if edge.dotted && !report.fallback_edges.contains(&pair) {
            report.fallback_edges.push(pair);
        }
    }

    for (actor, &count) in actors.iter().zip(&actor_counts) {
        if count == 0 {
            report.actors_with_no_connections.push(actor.name.clone());
        }
    }
    for (module, &count) in modules.iter().zip(&module_counts) {
        if count == 0 {
            report.modules_with_no_connections.push(module.name.clone());
            if is_key_module(&module.name) {
                report.key_modules_missing_or_orphaned.push(module.name.clone());
            }
        }
    }

    tracing::debug!(
        nodes = parsed.labels.len(),
        edges = parsed.edges.len(),
        orphan_actors = report.actors_with_no_connections.len(),
        orphan_modules = report.modules_with_no_connections.len(),
        suspicious = report.suspicious_client_edges.len(),
        orphan_key_modules = report.key_modules_missing_or_orphaned.len(),
        "analyzed diagram"
    );

    report
}
