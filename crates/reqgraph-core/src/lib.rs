pub mod diagnostics;
mod error;
pub mod fallback;
pub mod graph;
pub mod rules;
pub mod score;
pub mod text;

pub use diagnostics::{analyze_diagram, ActorModuleEdge, DiagnosticsReport};
pub use error::SettingsError;
pub use graph::{
    build_graph, synthesize_graph, EdgeKind, Graph, GraphEdge, GraphNode, NodeKind, SynthesisOptions,
};

use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// --- Types ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, schemars::JsonSchema)]
pub enum Priority {
    #[serde(rename = "must-have", alias = "Must-have", alias = "must_have", alias = "mustHave", alias = "must")]
    MustHave,
    #[default]
    #[serde(rename = "should-have", alias = "Should-have", alias = "should_have", alias = "shouldHave", alias = "should")]
    ShouldHave,
    #[serde(rename = "nice-to-have", alias = "Nice-to-have", alias = "nice_to_have", alias = "niceToHave", alias = "nice")]
    NiceToHave,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    #[serde(alias = "Low")]
    Low,
    #[default]
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "High")]
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[serde(alias = "Rare")]
    Rare,
    #[default]
    #[serde(alias = "Sometimes")]
    Sometimes,
    #[serde(alias = "Often")]
    Often,
    #[serde(alias = "Constant")]
    Constant,
}

/// A role or persona in the target business process. Identified by `name`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A proposed functional capability. Identified by `name`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CandidateModule {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PainPoint {
    pub description: String,
    #[serde(default)]
    pub impact: Impact,
    #[serde(default)]
    pub frequency: Frequency,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadedDocument {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// What the extraction pass took away from this document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Output of one extraction pass over a requirements transcript.
///
/// Every collection deserializes to empty when the field is absent or `null`,
/// so downstream code never has to distinguish the two.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequirementsSummary {
    #[serde(default, deserialize_with = "null_as_default")]
    pub business_context: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub primary_goals: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub secondary_goals: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub actors: Vec<Actor>,
    #[serde(default, deserialize_with = "null_as_default", alias = "modules")]
    pub candidate_modules: Vec<CandidateModule>,
    #[serde(default, deserialize_with = "null_as_default", alias = "tools")]
    pub current_tools: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pain_points: Vec<PainPoint>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub non_functional_requirements: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub risks: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub open_questions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub uploaded_documents: Vec<UploadedDocument>,
    /// Diagram authored by the extraction step itself, if it produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_diagram: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl RequirementsSummary {
    /// Primary goals followed by secondary goals.
    pub fn goals(&self) -> impl Iterator<Item = &str> {
        self.primary_goals
            .iter()
            .chain(&self.secondary_goals)
            .map(String::as_str)
    }

    /// The extractor-authored diagram, if it carries any content.
    pub fn authored_diagram(&self) -> Option<&str> {
        self.relationship_diagram
            .as_deref()
            .filter(|d| !d.trim().is_empty())
    }

    /// Fill every field left empty in `self` from `base`.
    ///
    /// A refinement pass adjusts content; it never drops something the base
    /// pass found.
    pub fn backfill_from(mut self, base: &RequirementsSummary) -> Self {
        fn keep<T: Clone>(field: &mut Vec<T>, base: &[T]) {
            if field.is_empty() && !base.is_empty() {
                *field = base.to_vec();
            }
        }

        if self.business_context.trim().is_empty() {
            self.business_context = base.business_context.clone();
        }
        keep(&mut self.primary_goals, &base.primary_goals);
        keep(&mut self.secondary_goals, &base.secondary_goals);
        keep(&mut self.actors, &base.actors);
        keep(&mut self.candidate_modules, &base.candidate_modules);
        keep(&mut self.current_tools, &base.current_tools);
        keep(&mut self.pain_points, &base.pain_points);
        keep(&mut self.non_functional_requirements, &base.non_functional_requirements);
        keep(&mut self.risks, &base.risks);
        keep(&mut self.open_questions, &base.open_questions);
        keep(&mut self.uploaded_documents, &base.uploaded_documents);
        if self.relationship_diagram.is_none() {
            self.relationship_diagram = base.relationship_diagram.clone();
        }
        self
    }
}

// --- AI Settings ---

fn default_score_threshold() -> u8 {
    graph::DEFAULT_SCORE_THRESHOLD
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub api_key: String,
    /// Model used for the base extraction pass
    #[serde(default)]
    pub model: String,
    /// Stronger model used for refinement. Empty means reuse `model`.
    #[serde(default)]
    pub refine_model: String,
    #[serde(default = "default_score_threshold")]
    pub score_threshold: u8,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: String::new(),
            api_key: String::new(),
            model: String::new(),
            refine_model: String::new(),
            score_threshold: default_score_threshold(),
        }
    }
}

impl AiSettings {
    pub fn refinement_model(&self) -> &str {
        if self.refine_model.is_empty() {
            &self.model
        } else {
            &self.refine_model
        }
    }
}

/// Resolve the global settings directory (~/.reqgraph/).
pub fn settings_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".reqgraph")
}

fn settings_path() -> PathBuf {
    settings_dir().join("settings.json")
}

pub fn read_settings() -> AiSettings {
    read_settings_from(&settings_path())
}

pub fn write_settings(settings: &AiSettings) -> Result<(), SettingsError> {
    write_settings_to(&settings_path(), settings)
}

/// Missing or unreadable files yield defaults.
fn read_settings_from(path: &Path) -> AiSettings {
    if !path.exists() {
        return AiSettings::default();
    }
    match fs::read_to_string(path)
        .map_err(SettingsError::from)
        .and_then(|s| serde_json::from_str(&s).map_err(SettingsError::from))
    {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable settings");
            AiSettings::default()
        }
    }
}

fn write_settings_to(path: &Path, settings: &AiSettings) -> Result<(), SettingsError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn ai_configured(settings: &AiSettings) -> bool {
    !settings.provider.is_empty()
        && !settings.model.is_empty()
        && (settings.provider == "ollama" || !settings.api_key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_and_missing_collections_become_empty() {
        let raw = r#"{
            "businessContext": "Invoice handling for a consultancy",
            "actors": null,
            "candidateModules": [{"name": "Invoice Portal", "priority": "Must-have"}],
            "painPoints": [{"description": "late invoices", "impact": "High"}]
        }"#;
        let summary: RequirementsSummary = serde_json::from_str(raw).unwrap();
        assert!(summary.actors.is_empty());
        assert!(summary.uploaded_documents.is_empty());
        assert!(summary.current_tools.is_empty());
        assert_eq!(summary.candidate_modules[0].priority, Priority::MustHave);
        assert_eq!(summary.pain_points[0].impact, Impact::High);
        assert_eq!(summary.pain_points[0].frequency, Frequency::Sometimes);
    }

    #[test]
    fn priority_serializes_with_hyphens() {
        let json = serde_json::to_string(&Priority::NiceToHave).unwrap();
        assert_eq!(json, "\"nice-to-have\"");
    }

    #[test]
    fn backfill_keeps_base_content() {
        let base = RequirementsSummary {
            business_context: "context".into(),
            current_tools: vec!["QuickBooks".into()],
            uploaded_documents: vec![UploadedDocument {
                filename: "notes.pdf".into(),
                mime_type: None,
                summary: None,
            }],
            ..Default::default()
        };
        let refined = RequirementsSummary {
            actors: vec![Actor {
                name: "Owner".into(),
                description: String::new(),
            }],
            ..Default::default()
        }
        .backfill_from(&base);

        assert_eq!(refined.business_context, "context");
        assert_eq!(refined.current_tools, vec!["QuickBooks".to_string()]);
        assert_eq!(refined.uploaded_documents.len(), 1);
        assert_eq!(refined.actors.len(), 1);
    }

    #[test]
    fn refinement_model_falls_back_to_base_model() {
        let mut settings = AiSettings {
            provider: "anthropic".into(),
            model: "small".into(),
            ..Default::default()
        };
        assert_eq!(settings.refinement_model(), "small");
        settings.refine_model = "large".into();
        assert_eq!(settings.refinement_model(), "large");
        assert_eq!(settings.score_threshold, 2);
    }

    #[test]
    fn settings_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        assert_eq!(read_settings_from(&path), AiSettings::default());

        let settings = AiSettings {
            provider: "anthropic".into(),
            api_key: "sk-test".into(),
            model: "small".into(),
            refine_model: "large".into(),
            score_threshold: 3,
        };
        write_settings_to(&path, &settings).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("\"refineModel\": \"large\""));
        assert_eq!(read_settings_from(&path), settings);

        fs::write(&path, "{ not json").unwrap();
        assert_eq!(read_settings_from(&path), AiSettings::default());
    }

    #[test]
    fn ollama_needs_no_api_key() {
        let settings = AiSettings {
            provider: "ollama".into(),
            model: "llama3".into(),
            ..Default::default()
        };
        assert!(ai_configured(&settings));
        let settings = AiSettings {
            provider: "openai".into(),
            ..settings
        };
        assert!(!ai_configured(&settings));
    }
}
