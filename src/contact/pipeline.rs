//! Contact pipeline: classify on a best-effort basis, then always notify.
//!
//! Neither step can fail the request: a classifier error becomes "no
//! analysis" and a notifier error becomes `telegram_sent: false`.

use std::sync::Arc;

use tracing::{info, warn};

use super::types::Submission;
use crate::analysis::{Classification, MessageClassifier};
use crate::channels::Notifier;

/// What happened to an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactOutcome {
    pub analysis: Option<Classification>,
    pub telegram_sent: bool,
}

/// Runs the best-effort steps for a validated submission.
#[derive(Clone)]
pub struct ContactPipeline {
    classifier: Option<Arc<dyn MessageClassifier>>,
    notifier: Arc<dyn Notifier>,
}

impl ContactPipeline {
    pub fn new(
        classifier: Option<Arc<dyn MessageClassifier>>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            classifier,
            notifier,
        }
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn notifier_configured(&self) -> bool {
        self.notifier.is_configured()
    }

    /// Classify, then notify regardless of the classification result.
    pub async fn process(&self, submission: &Submission) -> ContactOutcome {
        let analysis = self.classify(submission).await;
        let telegram_sent = self.notify(submission, analysis.as_ref()).await;

        ContactOutcome {
            analysis,
            telegram_sent,
        }
    }

    async fn classify(&self, submission: &Submission) -> Option<Classification> {
        let Some(classifier) = &self.classifier else {
            info!("No classifier configured, skipping analysis");
            return None;
        };

        match classifier.classify(submission).await {
            Ok(classification) => {
                info!(
                    category = %classification.category,
                    urgency = %classification.urgency,
                    actionable = classification.is_actionable,
                    "Submission classified"
                );
                Some(classification)
            }
            Err(e) => {
                warn!(error = %e, "Classification failed, continuing without analysis");
                None
            }
        }
    }

    async fn notify(&self, submission: &Submission, analysis: Option<&Classification>) -> bool {
        match self.notifier.notify(submission, analysis).await {
            Ok(()) => {
                info!(channel = self.notifier.name(), "Notification delivered");
                true
            }
            Err(e) => {
                warn!(channel = self.notifier.name(), error = %e, "Notification failed");
                false
            }
        }
    }
}
