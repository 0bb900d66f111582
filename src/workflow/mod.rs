pub mod commands;
pub mod publish;
pub mod types;

pub use publish::PublishWorkflow;
pub use types::{Step, StepRecord, WorkflowReport};
