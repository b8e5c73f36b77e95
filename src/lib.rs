pub mod agents;
pub mod coupling;
pub mod engine;
pub mod grid;
pub mod groundwater;
pub mod hillslope;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod web;

pub use coupling::{CoupledModel, StepSummary};
pub use engine::{Engine, EngineSettings};
pub use scenario::{Scenario, ScenarioLoader};
