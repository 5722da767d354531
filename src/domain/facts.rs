use super::PolicyMode;

/// Facts about one generated answer, as supplied by the upstream
/// retrieval, generation and bias scoring services.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationFacts {
    pub prompt: String,
    pub answer: String,
    pub confidence: f64,
    pub bias_score: f64,
    pub sources_count: usize,
    pub consistency_score: f64,
    pub evidence_flags: Vec<String>,
}

impl EvaluationFacts {
    /// Prompt and answer joined the way blocklist matching sees them.
    pub fn searchable_text(&self) -> String {
        format!("{}\n{}", self.prompt, self.answer).to_lowercase()
    }
}

/// One answer submitted for governance by a tenant.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub tenant_id: String,
    pub user_id: String,
    pub model_id: String,
    pub policy_mode: PolicyMode,
    pub facts: EvaluationFacts,
}
