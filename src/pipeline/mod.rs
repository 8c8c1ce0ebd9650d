pub mod orchestrator;
pub mod state;

pub use orchestrator::{Orchestrator, RunResult};
pub use state::{Phase, PhaseErrorRecord, PipelineState, StateManager, new_run_id};
