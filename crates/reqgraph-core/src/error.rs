use thiserror::Error;

/// Failure reading or writing `~/.reqgraph/settings.json`.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings json: {0}")]
    Json(#[from] serde_json::Error),
}
