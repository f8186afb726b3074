use serde::{Deserialize, Serialize};

/// Events that drive an item through the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ItemEvent {
    StartInsight,
    InsightSucceeded,
    InsightFailed(String),
    StartGenerate,
    GenerateSucceeded,
    GenerateFailed(String),
    StartDeliver,
    DeliverSucceeded,
    DeliverFailed(String),
    /// Settle a stage outcome into its terminal state
    Finish,
    /// Stop processing from any non-terminal state (cancellation, panic)
    Abort(String),
}

impl ItemEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::StartInsight => "start_insight",
            Self::InsightSucceeded => "insight_succeeded",
            Self::InsightFailed(_) => "insight_failed",
            Self::StartGenerate => "start_generate",
            Self::GenerateSucceeded => "generate_succeeded",
            Self::GenerateFailed(_) => "generate_failed",
            Self::StartDeliver => "start_deliver",
            Self::DeliverSucceeded => "deliver_succeeded",
            Self::DeliverFailed(_) => "deliver_failed",
            Self::Finish => "finish",
            Self::Abort(_) => "abort",
        }
    }

    /// Extract error message if this is a failure event
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::InsightFailed(msg)
            | Self::GenerateFailed(msg)
            | Self::DeliverFailed(msg)
            | Self::Abort(msg) => Some(msg),
            _ => None,
        }
    }
}
