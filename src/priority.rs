use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PriorityLabel {
    High,
    Medium,
    Low,
}

// Raw priority as it arrives from the task source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriorityInput {
    Level(i64),
    Text(String),
}

impl From<i64> for PriorityInput {
    fn from(level: i64) -> Self {
        PriorityInput::Level(level)
    }
}

impl From<&str> for PriorityInput {
    fn from(text: &str) -> Self {
        PriorityInput::Text(text.to_string())
    }
}

const HIGH_TOKENS: [&str; 2] = ["high", "高"];
const LOW_TOKENS: [&str; 2] = ["low", "低"];

/// Map a priority to three levels.
///
/// Numeric: >= 4 High, 3 Medium, <= 2 Low.
/// Text is keyword-matched; anything unrecognized is Medium so rendering never blocks.
pub fn classify(priority: impl Into<PriorityInput>) -> PriorityLabel {
    match priority.into() {
        PriorityInput::Level(n) if n >= 4 => PriorityLabel::High,
        PriorityInput::Level(3) => PriorityLabel::Medium,
        PriorityInput::Level(_) => PriorityLabel::Low,
        PriorityInput::Text(text) => {
            let lower = text.to_lowercase();
            if HIGH_TOKENS.iter().any(|t| lower.contains(t)) {
                PriorityLabel::High
            } else if LOW_TOKENS.iter().any(|t| lower.contains(t)) {
                PriorityLabel::Low
            } else {
                PriorityLabel::Medium
            }
        }
    }
}

impl PriorityLabel {
    /// Visual class tag for the presentation layer.
    pub fn class(self) -> &'static str {
        match self {
            PriorityLabel::High => "priority-high",
            PriorityLabel::Medium => "priority-medium",
            PriorityLabel::Low => "priority-low",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PriorityLabel::High => "High",
            PriorityLabel::Medium => "Medium",
            PriorityLabel::Low => "Low",
        }
    }
}
