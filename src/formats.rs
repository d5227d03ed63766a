use serde::Deserialize;

/// One entry of the case index listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseLink {
    pub title: String,
    pub url: String,
}

/// Decoded embedded study object: `{ series: [...] }`.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddedObject {
    #[serde(default)]
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Series {
    #[serde(default)]
    pub label: Option<String>,
    pub instances: Vec<Instance>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Instance {
    pub url: String,
}

pub const UNKNOWN_LABEL: &str = "unknown_label";

impl Series {
    /// Label used in file names; missing or blank labels fall back to
    /// [`UNKNOWN_LABEL`].
    pub fn label_or_placeholder(&self) -> &str {
        match self.label.as_deref() {
            Some(label) if !label.trim().is_empty() => label,
            _ => UNKNOWN_LABEL,
        }
    }
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub downloaded: usize,
    pub skipped: usize,
    pub duplicates: usize,
    pub failed: usize,
}
