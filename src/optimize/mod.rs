//! Villager optimization: problem setup, plans and plan validation

pub mod plan;
pub mod problem;
pub mod validator;

pub use plan::{KeptVillager, Plan, PlanStatus, PlanSummary};
pub use problem::{OptimizationProblem, ProblemStatistics};
pub use validator::{PlanValidator, ValidationResult};
