// Per-item state machine for the Insight -> Generate -> Deliver pipeline.
//
// Queued -> InsightRunning -> {InsightOk, InsightFailed}
// InsightOk -> GenerateRunning -> {GenerateOk, GenerateFailed}
// GenerateOk -> DeliverRunning -> {DeliverOk, DeliverFailed}
// Terminal: Success (all ok), Partial (Deliver failed), Failed (Insight or Generate failed)

pub mod errors;
pub mod events;
pub mod item_state_machine;
pub mod states;

pub use errors::{StateMachineError, StateMachineResult};
pub use events::ItemEvent;
pub use item_state_machine::{ItemStateMachine, ItemTransition};
pub use states::ItemState;
