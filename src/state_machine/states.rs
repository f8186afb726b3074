use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{OverallStatus, StageKind};

/// Per-item pipeline states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    /// Enqueued, not yet picked up by a worker
    #[default]
    Queued,
    InsightRunning,
    InsightOk,
    InsightFailed,
    GenerateRunning,
    GenerateOk,
    GenerateFailed,
    DeliverRunning,
    DeliverOk,
    DeliverFailed,
    /// All three stages succeeded
    Success,
    /// Generate succeeded, Deliver failed; generated output is kept
    Partial,
    /// Insight or Generate failed, or the item was aborted
    Failed,
}

impl ItemState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Partial | Self::Failed)
    }

    /// Check if a stage is currently executing
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            Self::InsightRunning | Self::GenerateRunning | Self::DeliverRunning
        )
    }

    /// Stage this state belongs to, if any
    pub fn stage(&self) -> Option<StageKind> {
        match self {
            Self::InsightRunning | Self::InsightOk | Self::InsightFailed => Some(StageKind::Insight),
            Self::GenerateRunning | Self::GenerateOk | Self::GenerateFailed => {
                Some(StageKind::Generate)
            }
            Self::DeliverRunning | Self::DeliverOk | Self::DeliverFailed => Some(StageKind::Deliver),
            _ => None,
        }
    }

    /// Overall status for terminal states
    pub fn overall_status(&self) -> Option<OverallStatus> {
        match self {
            Self::Success => Some(OverallStatus::Success),
            Self::Partial => Some(OverallStatus::Partial),
            Self::Failed => Some(OverallStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Queued => "queued",
            Self::InsightRunning => "insight_running",
            Self::InsightOk => "insight_ok",
            Self::InsightFailed => "insight_failed",
            Self::GenerateRunning => "generate_running",
            Self::GenerateOk => "generate_ok",
            Self::GenerateFailed => "generate_failed",
            Self::DeliverRunning => "deliver_running",
            Self::DeliverOk => "deliver_ok",
            Self::DeliverFailed => "deliver_failed",
            Self::Success => "success",
            Self::Partial => "partial",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for ItemState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "insight_running" => Ok(Self::InsightRunning),
            "insight_ok" => Ok(Self::InsightOk),
            "insight_failed" => Ok(Self::InsightFailed),
            "generate_running" => Ok(Self::GenerateRunning),
            "generate_ok" => Ok(Self::GenerateOk),
            "generate_failed" => Ok(Self::GenerateFailed),
            "deliver_running" => Ok(Self::DeliverRunning),
            "deliver_ok" => Ok(Self::DeliverOk),
            "deliver_failed" => Ok(Self::DeliverFailed),
            "success" => Ok(Self::Success),
            "partial" => Ok(Self::Partial),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid item state: {s}")),
        }
    }
}
