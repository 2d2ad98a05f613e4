//! The research pipeline: state, reasoning steps, report rendering and the
//! orchestrator that sequences them.

pub mod builder;
pub mod orchestrator;
pub mod prompts;
pub mod report;
pub mod state;
pub mod steps;

pub use orchestrator::{
    degraded_block, route_after_reflect, PipelineOptions, ResearchOutput, ResearchPipeline, Step,
};
pub use report::render_report;
pub use state::{NotificationOutcome, ResearchState, StateUpdate, StepTimings, TOTAL_TIMING};
pub use steps::{fallback_query, generate_query, reflect, strip_deliberation, summarize};
