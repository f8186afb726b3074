use tracing::{debug, trace};

use super::{
    errors::{StateMachineError, StateMachineResult},
    events::ItemEvent,
    states::ItemState,
};

/// One recorded transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemTransition {
    pub from: ItemState,
    pub to: ItemState,
    pub event: &'static str,
}

/// In-memory state machine for a single work item.
///
/// Owned by the worker processing the item, so it needs no synchronisation.
#[derive(Debug, Clone)]
pub struct ItemStateMachine {
    item_id: String,
    state: ItemState,
    history: Vec<ItemTransition>,
}

impl ItemStateMachine {
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            state: ItemState::Queued,
            history: Vec::new(),
        }
    }

    pub fn current_state(&self) -> ItemState {
        self.state
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn history(&self) -> &[ItemTransition] {
        &self.history
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Apply `event`, returning the new state
    pub fn transition(&mut self, event: ItemEvent) -> StateMachineResult<ItemState> {
        let target = Self::determine_target_state(self.state, &event)?;

        trace!(
            item_id = %self.item_id,
            from = %self.state,
            to = %target,
            event = event.event_type(),
            "Item state transition"
        );
        if target.is_terminal() {
            debug!(
                item_id = %self.item_id,
                state = %target,
                error = event.error_message(),
                "📋 ITEM: Reached terminal state"
            );
        }

        self.history.push(ItemTransition {
            from: self.state,
            to: target,
            event: event.event_type(),
        });
        self.state = target;
        Ok(target)
    }

    /// Pure transition table
    pub fn determine_target_state(
        current: ItemState,
        event: &ItemEvent,
    ) -> StateMachineResult<ItemState> {
        use ItemEvent as E;
        use ItemState as S;

        if current.is_terminal() {
            return Err(StateMachineError::AlreadyTerminal {
                state: current.to_string(),
            });
        }

        let target = match (current, event) {
            (S::Queued, E::StartInsight) => S::InsightRunning,
            (S::InsightRunning, E::InsightSucceeded) => S::InsightOk,
            (S::InsightRunning, E::InsightFailed(_)) => S::InsightFailed,

            (S::InsightOk, E::StartGenerate) => S::GenerateRunning,
            (S::GenerateRunning, E::GenerateSucceeded) => S::GenerateOk,
            (S::GenerateRunning, E::GenerateFailed(_)) => S::GenerateFailed,

            (S::GenerateOk, E::StartDeliver) => S::DeliverRunning,
            (S::DeliverRunning, E::DeliverSucceeded) => S::DeliverOk,
            (S::DeliverRunning, E::DeliverFailed(_)) => S::DeliverFailed,

            // Settling stage outcomes
            (S::DeliverOk, E::Finish) => S::Success,
            (S::DeliverFailed, E::Finish) => S::Partial,
            (S::InsightFailed | S::GenerateFailed, E::Finish) => S::Failed,

            (_, E::Abort(_)) => S::Failed,

            (from, _) => {
                return Err(StateMachineError::InvalidTransition {
                    from: from.to_string(),
                    event: event.event_type().to_string(),
                })
            }
        };

        Ok(target)
    }
}
