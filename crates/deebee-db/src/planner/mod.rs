pub(crate) mod plan;
#[allow(clippy::module_inception)]
mod planner;

pub use plan::QueryPlan;
pub(crate) use plan::{Access, Plan, ScanRange};
pub(crate) use planner::plan;
