//! Run loop around a coupled model: deterministic RNG streams, interval
//! snapshots, and a per-step hook for observers.

use std::path::PathBuf;

use anyhow::Result;

use crate::{
    coupling::{CoupledModel, StepSummary},
    rng::RngManager,
    snapshot::SnapshotWriter,
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub snapshot_interval_steps: u64,
    pub snapshot_dir: PathBuf,
}

pub struct Engine {
    rng: RngManager,
    snapshot_writer: SnapshotWriter,
    settings: EngineSettings,
}

impl Engine {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            rng: RngManager::new(settings.seed),
            snapshot_writer: SnapshotWriter::new(
                &settings.snapshot_dir,
                settings.snapshot_interval_steps,
            ),
            settings,
        }
    }

    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }

    pub fn run(&mut self, model: &mut CoupledModel, steps: u64) -> Result<()> {
        self.run_with_hook(model, steps, |_, _| {})
    }

    /// Drive `steps` coupling steps, invoking the hook after each one with
    /// the stepped model and its summary. Errors from either side of the
    /// coupling end the run immediately.
    pub fn run_with_hook(
        &mut self,
        model: &mut CoupledModel,
        steps: u64,
        mut hook: impl FnMut(&CoupledModel, &StepSummary),
    ) -> Result<()> {
        for _ in 0..steps {
            let mut summary = model.step(&mut self.rng)?;
            let frame = model.frame(&self.settings.scenario_name);
            summary.snapshot_path = self.snapshot_writer.maybe_write(&frame)?;
            hook(model, &summary);
        }
        Ok(())
    }
}
