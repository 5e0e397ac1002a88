pub mod orchestrator;
pub mod state;

pub use orchestrator::Orchestrator;
pub use state::{Stage, WorkflowOutcome, WorkflowState};
