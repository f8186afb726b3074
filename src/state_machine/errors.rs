use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateMachineError {
    #[error("Invalid transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },

    #[error("Item is already in terminal state {state}")]
    AlreadyTerminal { state: String },
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
