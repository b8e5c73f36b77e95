//! The coupling loop: a six-phase exchange between a grid-based land model
//! and an agent population sharing the same raster.
//!
//! Each step: advance the land model, derive an observation field from its
//! state, let the agents react to the observation, aggregate agent state
//! into a forcing field, and hand the forcing back to the land model for the
//! next step. The two sides never hold references into each other; the
//! observation and the forcing are the only traffic across the seam.

use std::time::Instant;

use anyhow::Result;
use serde::Serialize;
use thiserror::Error;

use crate::{
    grid::{GridError, ScalarField},
    rng::{RngManager, StreamRng},
};

/// Grid-based numerical simulation side of the coupling.
///
/// `apply_forcing` receives whatever `AgentModel::aggregate` produced; each
/// implementation documents the physical meaning of that field.
pub trait LandModel: Send {
    fn name(&self) -> &'static str;
    fn shape(&self) -> (usize, usize);
    /// Advance the simulation by `dt_days`.
    fn advance(&mut self, dt_days: f64) -> Result<()>;
    /// Derive the scalar field the agents observe this step.
    fn observe(&self) -> ScalarField;
    /// Install the aggregated agent field as forcing for subsequent steps.
    fn apply_forcing(&mut self, forcing: &ScalarField) -> Result<(), GridError>;
    /// Primary state field, reported in frames.
    fn state_field(&self) -> &ScalarField;
    /// Label for the primary state field, e.g. `"head_m"`.
    fn state_label(&self) -> &'static str;
}

/// Agent population side of the coupling.
pub trait AgentModel: Send {
    fn name(&self) -> &'static str;
    fn shape(&self) -> (usize, usize);
    /// One activation pass: every agent updates its own state from the
    /// read-only observation. Activation order is a seeded shuffle.
    fn step(&mut self, observation: &ScalarField, rng: &mut StreamRng<'_>) -> Result<()>;
    /// Aggregate current agent state into the forcing field. Read-only:
    /// calling this twice without a step in between yields the same field.
    fn aggregate(&self) -> ScalarField;
    fn census(&self) -> Census;
    /// One marker per discrete agent, for frames. Whole-cell agents such as
    /// grass patches are carried by the aggregate field instead.
    fn markers(&self) -> Vec<AgentMarker>;
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Census {
    /// All agents in the population, grass patches included.
    pub total: u64,
    /// Agents whose activity flag is currently set (pumping farmers,
    /// fully grown grass).
    pub active: u64,
    pub kinds: Vec<KindCount>,
}

#[derive(Clone, Debug, Serialize)]
pub struct KindCount {
    pub kind: &'static str,
    pub count: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct AgentMarker {
    pub kind: &'static str,
    pub row: usize,
    pub col: usize,
    pub active: bool,
}

#[derive(Debug, Error)]
pub enum CouplingError {
    #[error(
        "land grid is {land_rows}x{land_cols} but agent grid is {agent_rows}x{agent_cols}; \
         both sides must share one grid"
    )]
    GridMismatch {
        land_rows: usize,
        land_cols: usize,
        agent_rows: usize,
        agent_cols: usize,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct PhaseReport {
    pub phase: &'static str,
    pub duration_ms: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct StepSummary {
    pub step: u64,
    pub days_elapsed: f64,
    pub phases: Vec<PhaseReport>,
    pub census: Census,
    pub observation_min: f64,
    pub observation_max: f64,
    pub forcing_total: f64,
    pub snapshot_path: Option<std::path::PathBuf>,
}

/// Frame of the coupled state, as written to snapshots and streamed to the
/// live viewer.
#[derive(Clone, Debug, Serialize)]
pub struct FrameSnapshot {
    pub scenario: String,
    pub step: u64,
    pub days_elapsed: f64,
    pub rows: usize,
    pub cols: usize,
    pub state_label: &'static str,
    pub state: Vec<f64>,
    pub census: Census,
    pub markers: Vec<AgentMarker>,
}

/// A land model and an agent population locked to one shared grid.
pub struct CoupledModel {
    land: Box<dyn LandModel>,
    agents: Box<dyn AgentModel>,
    dt_days: f64,
    step: u64,
}

impl std::fmt::Debug for CoupledModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoupledModel")
            .field("land", &self.land.name())
            .field("agents", &self.agents.name())
            .field("dt_days", &self.dt_days)
            .field("step", &self.step)
            .finish()
    }
}

impl CoupledModel {
    /// Both sides must already be initialized on grids of identical shape.
    pub fn new(
        land: Box<dyn LandModel>,
        agents: Box<dyn AgentModel>,
        dt_days: f64,
    ) -> Result<Self, CouplingError> {
        let (land_rows, land_cols) = land.shape();
        let (agent_rows, agent_cols) = agents.shape();
        if (land_rows, land_cols) != (agent_rows, agent_cols) {
            return Err(CouplingError::GridMismatch {
                land_rows,
                land_cols,
                agent_rows,
                agent_cols,
            });
        }
        Ok(Self {
            land,
            agents,
            dt_days,
            step: 0,
        })
    }

    pub fn step_count(&self) -> u64 {
        self.step
    }

    pub fn dt_days(&self) -> f64 {
        self.dt_days
    }

    pub fn days_elapsed(&self) -> f64 {
        self.step as f64 * self.dt_days
    }

    pub fn land(&self) -> &dyn LandModel {
        self.land.as_ref()
    }

    pub fn agents(&self) -> &dyn AgentModel {
        self.agents.as_ref()
    }

    /// Run one step of the six-phase exchange. Any error from either side
    /// propagates out unhandled; there is no retry or recovery.
    pub fn step(&mut self, rng: &mut RngManager) -> Result<StepSummary> {
        let mut phases = Vec::with_capacity(5);
        let mut timed = |phase: &'static str, start: Instant| {
            phases.push(PhaseReport {
                phase,
                duration_ms: start.elapsed().as_secs_f64() * 1_000.0,
            });
        };

        let start = Instant::now();
        self.land.advance(self.dt_days)?;
        timed("advance", start);

        let start = Instant::now();
        let observation = self.land.observe();
        let (rows, cols) = self.agents.shape();
        observation.ensure_shape(rows, cols)?;
        timed("observe", start);

        let start = Instant::now();
        let mut stream = rng.stream(self.agents.name());
        self.agents.step(&observation, &mut stream)?;
        timed("agents", start);

        let start = Instant::now();
        let forcing = self.agents.aggregate();
        timed("aggregate", start);

        let start = Instant::now();
        self.land.apply_forcing(&forcing)?;
        timed("forcing", start);

        self.step += 1;
        Ok(StepSummary {
            step: self.step,
            days_elapsed: self.days_elapsed(),
            phases,
            census: self.agents.census(),
            observation_min: observation.min(),
            observation_max: observation.max(),
            forcing_total: forcing.total(),
            snapshot_path: None,
        })
    }

    pub fn frame(&self, scenario: &str) -> FrameSnapshot {
        let (rows, cols) = self.land.shape();
        FrameSnapshot {
            scenario: scenario.to_string(),
            step: self.step,
            days_elapsed: self.days_elapsed(),
            rows,
            cols,
            state_label: self.land.state_label(),
            state: self.land.state_field().values().to_vec(),
            census: self.agents.census(),
            markers: self.agents.markers(),
        }
    }
}
