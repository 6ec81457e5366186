//! AI analysis of contact submissions.

pub mod classifier;
pub mod model;

pub use classifier::{LlmClassifier, MessageClassifier, parse_classification};
pub use model::{Category, Classification, Urgency};
