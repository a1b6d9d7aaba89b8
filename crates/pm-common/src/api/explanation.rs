use serde::{Deserialize, Serialize};

/// Natural-language match rationale for a (viewer, candidate) pair.
/// Cached keyed by (viewer, candidate, mode, prompt version), so the
/// shape must stay stable within a prompt version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchExplanation {
    pub headline: String,
    pub reasons: Vec<String>,
    pub risks: Vec<String>,
    pub icebreaker: String,
    pub pod_idea: String,
    pub prompt_version: String,
}

impl MatchExplanation {
    /// Clamp list fields to the shape the clients render.
    pub fn clamped(mut self) -> Self {
        self.reasons.truncate(3);
        self.risks.truncate(2);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AskSource {
    Ai,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskAnswer {
    pub answer: String,
    pub source: AskSource,
}
