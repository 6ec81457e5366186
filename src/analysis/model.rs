//! Classification types produced by the message analyst.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What kind of message a submission is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Inquiry,
    Support,
    Spam,
    Partnership,
    Recruitment,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Self::Inquiry,
        Self::Support,
        Self::Spam,
        Self::Partnership,
        Self::Recruitment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inquiry => "inquiry",
            Self::Support => "support",
            Self::Spam => "spam",
            Self::Partnership => "partnership",
            Self::Recruitment => "recruitment",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How quickly a submission needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    High,
    Medium,
    Low,
}

impl Urgency {
    pub const ALL: [Urgency; 3] = [Self::High, Self::Medium, Self::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured analysis of one contact submission.
///
/// Deserialization is strict: an out-of-enum `category` or `urgency`, a
/// missing field, or an unknown field is an error rather than a coercion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Classification {
    pub category: Category,
    /// Two-word sentiment description, e.g. "Polite Frustration".
    pub sentiment: String,
    pub urgency: Urgency,
    /// One-sentence summary.
    pub summary: String,
    /// Whether the message needs a reply.
    pub is_actionable: bool,
    pub suggested_next_step: String,
}

impl Classification {
    /// Gemini `responseSchema` describing this type.
    pub fn response_schema() -> serde_json::Value {
        let categories: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
        let urgencies: Vec<&str> = Urgency::ALL.iter().map(Urgency::as_str).collect();

        serde_json::json!({
            "type": "OBJECT",
            "properties": {
                "category": {
                    "type": "STRING",
                    "enum": categories,
                    "description": "The classification of the message."
                },
                "sentiment": {
                    "type": "STRING",
                    "description": "Two word sentiment description (e.g., 'Polite Frustration')."
                },
                "urgency": {
                    "type": "STRING",
                    "enum": urgencies
                },
                "summary": {
                    "type": "STRING",
                    "description": "A concise 1-sentence summary."
                },
                "is_actionable": {
                    "type": "BOOLEAN",
                    "description": "Does this message require a reply?"
                },
                "suggested_next_step": {
                    "type": "STRING",
                    "description": "What should the receiver do next?"
                }
            },
            "required": [
                "category",
                "sentiment",
                "urgency",
                "summary",
                "is_actionable",
                "suggested_next_step"
            ],
            "propertyOrdering": [
                "category",
                "sentiment",
                "urgency",
                "summary",
                "is_actionable",
                "suggested_next_step"
            ]
        })
    }
}
