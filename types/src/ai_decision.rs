use serde::{Deserialize, Serialize};

/// What the AI opponent chose and why, for display only.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiDecision {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub type_lesson: Option<String>,
    #[serde(default)]
    pub strategic_insight: Option<String>,
}

impl AiDecision {
    /// Narrative lines in display order: explanation, lesson, insight.
    pub fn narrative(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(3);
        if !self.explanation.is_empty() {
            lines.push(format!("🤖 AI: {}", self.explanation));
        }
        if let Some(lesson) = self.type_lesson.as_deref().filter(|s| !s.is_empty()) {
            lines.push(format!("🎓 Type lesson: {lesson}"));
        }
        if let Some(insight) = self.strategic_insight.as_deref().filter(|s| !s.is_empty()) {
            lines.push(format!("🎯 Strategy: {insight}"));
        }
        lines
    }
}
