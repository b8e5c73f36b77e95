//! Scenario files: YAML descriptions of a coupled run.
//!
//! A scenario names the shared grid, one land model, one agent population,
//! and the run parameters. `build_model` assembles the coupled pair;
//! placement that the file leaves to chance (herd positions) is drawn from
//! the scenario seed, so a scenario file fully determines a run.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    agents::{FarmerPopulation, GrazingParams, GrazingPopulation},
    coupling::{AgentModel, CoupledModel, LandModel},
    grid::RasterGrid,
    groundwater::{GroundwaterModel, GroundwaterParams},
    hillslope::{SoilCreepModel, SoilCreepParams},
};

fn default_dt_days() -> f64 {
    1.0
}

fn default_snapshot_interval_steps() -> u64 {
    10
}

fn default_spacing_m() -> f64 {
    100.0
}

fn default_well_depth() -> f64 {
    7.0
}

fn default_pump_rate() -> f64 {
    400.0
}

fn default_regrowth_steps() -> u32 {
    8
}

fn default_slope_limit() -> f64 {
    0.15
}

fn default_sheep_gain() -> f64 {
    4.0
}

fn default_wolf_gain() -> f64 {
    20.0
}

fn default_sheep_reproduce() -> f64 {
    0.04
}

fn default_wolf_reproduce() -> f64 {
    0.05
}

fn default_initial_energy() -> f64 {
    10.0
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("scenario validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default = "default_dt_days")]
    pub dt_days: f64,
    #[serde(default)]
    pub steps: Option<u64>,
    #[serde(default = "default_snapshot_interval_steps")]
    pub snapshot_interval_steps: u64,
    pub grid: GridSpec,
    pub land: LandSpec,
    pub agents: AgentSpec,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridSpec {
    pub rows: usize,
    pub cols: usize,
    #[serde(default = "default_spacing_m")]
    pub spacing_m: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LandSpec {
    Groundwater {
        transmissivity_m2_per_day: f64,
        storage_coefficient: f64,
        ambient_recharge_m_per_day: f64,
        initial_head_m: f64,
        boundary_head_m: f64,
        surface_elevation_m: f64,
    },
    SoilCreep {
        diffusivity_m2_per_year: f64,
        #[serde(default)]
        cover_damping: f64,
        relief_m: f64,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentSpec {
    Farmers {
        wells: Vec<WellSpec>,
    },
    Grazing {
        initial_sheep: usize,
        initial_wolves: usize,
        #[serde(default = "default_regrowth_steps")]
        regrowth_steps: u32,
        #[serde(default = "default_slope_limit")]
        slope_limit: f64,
        #[serde(default = "default_sheep_gain")]
        sheep_gain_from_food: f64,
        #[serde(default = "default_wolf_gain")]
        wolf_gain_from_food: f64,
        #[serde(default = "default_sheep_reproduce")]
        sheep_reproduce_chance: f64,
        #[serde(default = "default_wolf_reproduce")]
        wolf_reproduce_chance: f64,
        #[serde(default = "default_initial_energy")]
        initial_energy: f64,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct WellSpec {
    pub row: usize,
    pub col: usize,
    #[serde(default = "default_well_depth")]
    pub well_depth_m: f64,
    #[serde(default = "default_pump_rate")]
    pub pump_rate_m3_per_day: f64,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario.validate()?;
        Ok(scenario)
    }
}

impl Scenario {
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.grid.rows < 3 || self.grid.cols < 3 {
            return Err(ScenarioError::Validation(format!(
                "grid must be at least 3x3 to leave an interior inside the boundary ring, got {}x{}",
                self.grid.rows, self.grid.cols
            )));
        }
        if self.dt_days <= 0.0 {
            return Err(ScenarioError::Validation(
                "dt_days must be positive".to_string(),
            ));
        }
        match &self.agents {
            AgentSpec::Farmers { wells } => {
                if wells.is_empty() {
                    return Err(ScenarioError::Validation(
                        "scenario must define at least one well".to_string(),
                    ));
                }
                for well in wells {
                    if well.row >= self.grid.rows || well.col >= self.grid.cols {
                        return Err(ScenarioError::Validation(format!(
                            "well at ({}, {}) is outside the {}x{} grid",
                            well.row, well.col, self.grid.rows, self.grid.cols
                        )));
                    }
                }
            }
            AgentSpec::Grazing {
                initial_sheep,
                slope_limit,
                ..
            } => {
                if *initial_sheep == 0 {
                    return Err(ScenarioError::Validation(
                        "grazing scenario must start with at least one sheep".to_string(),
                    ));
                }
                if *slope_limit <= 0.0 {
                    return Err(ScenarioError::Validation(
                        "slope_limit must be positive".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn build_model(&self) -> Result<CoupledModel> {
        let grid = RasterGrid::new(self.grid.rows, self.grid.cols, self.grid.spacing_m);
        let land: Box<dyn LandModel> = match &self.land {
            LandSpec::Groundwater {
                transmissivity_m2_per_day,
                storage_coefficient,
                ambient_recharge_m_per_day,
                initial_head_m,
                boundary_head_m,
                surface_elevation_m,
            } => Box::new(GroundwaterModel::new(
                grid,
                GroundwaterParams {
                    transmissivity_m2_per_day: *transmissivity_m2_per_day,
                    storage_coefficient: *storage_coefficient,
                    ambient_recharge_m_per_day: *ambient_recharge_m_per_day,
                    initial_head_m: *initial_head_m,
                    boundary_head_m: *boundary_head_m,
                    surface_elevation_m: *surface_elevation_m,
                },
            )),
            LandSpec::SoilCreep {
                diffusivity_m2_per_year,
                cover_damping,
                relief_m,
            } => Box::new(SoilCreepModel::new(
                grid,
                SoilCreepParams {
                    diffusivity_m2_per_year: *diffusivity_m2_per_year,
                    cover_damping: *cover_damping,
                    relief_m: *relief_m,
                },
            )),
        };

        let agents: Box<dyn AgentModel> = match &self.agents {
            AgentSpec::Farmers { wells } => {
                let mut population = FarmerPopulation::new(self.grid.rows, self.grid.cols);
                for well in wells {
                    population.place(
                        well.row,
                        well.col,
                        well.well_depth_m,
                        well.pump_rate_m3_per_day,
                    )?;
                }
                Box::new(population)
            }
            AgentSpec::Grazing {
                initial_sheep,
                initial_wolves,
                regrowth_steps,
                slope_limit,
                sheep_gain_from_food,
                wolf_gain_from_food,
                sheep_reproduce_chance,
                wolf_reproduce_chance,
                initial_energy,
            } => {
                let mut population = GrazingPopulation::new(
                    self.grid.rows,
                    self.grid.cols,
                    GrazingParams {
                        regrowth_steps: *regrowth_steps,
                        slope_limit: *slope_limit,
                        sheep_gain_from_food: *sheep_gain_from_food,
                        wolf_gain_from_food: *wolf_gain_from_food,
                        sheep_reproduce_chance: *sheep_reproduce_chance,
                        wolf_reproduce_chance: *wolf_reproduce_chance,
                        initial_energy: *initial_energy,
                    },
                );
                // Herd placement is drawn from the scenario seed so the file
                // alone determines the run.
                let mut placement = ChaCha8Rng::seed_from_u64(self.seed);
                for _ in 0..*initial_sheep {
                    let row = placement.gen_range(0..self.grid.rows);
                    let col = placement.gen_range(0..self.grid.cols);
                    population.place_sheep(row, col)?;
                }
                for _ in 0..*initial_wolves {
                    let row = placement.gen_range(0..self.grid.rows);
                    let col = placement.gen_range(0..self.grid.cols);
                    population.place_wolf(row, col)?;
                }
                Box::new(population)
            }
        };

        Ok(CoupledModel::new(land, agents, self.dt_days)?)
    }

    pub fn steps(&self, override_steps: Option<u64>) -> u64 {
        override_steps.or(self.steps).unwrap_or(120)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_WELLFIELD: &str = r#"
name: minimal
seed: 3
grid:
  rows: 5
  cols: 5
land:
  kind: groundwater
  transmissivity_m2_per_day: 250.0
  storage_coefficient: 0.02
  ambient_recharge_m_per_day: 0.0
  initial_head_m: 95.0
  boundary_head_m: 95.0
  surface_elevation_m: 100.0
agents:
  kind: farmers
  wells:
    - row: 2
      col: 2
"#;

    #[test]
    fn minimal_scenario_parses_with_defaults() {
        let scenario: Scenario = serde_yaml::from_str(MINIMAL_WELLFIELD).unwrap();
        scenario.validate().unwrap();
        assert_eq!(scenario.dt_days, 1.0);
        assert_eq!(scenario.snapshot_interval_steps, 10);
        assert_eq!(scenario.steps(None), 120);
        assert_eq!(scenario.steps(Some(7)), 7);
        match &scenario.agents {
            AgentSpec::Farmers { wells } => {
                assert_eq!(wells[0].well_depth_m, 7.0);
                assert_eq!(wells[0].pump_rate_m3_per_day, 400.0);
            }
            _ => panic!("expected farmers"),
        }
    }

    #[test]
    fn well_outside_grid_fails_validation() {
        let mut scenario: Scenario = serde_yaml::from_str(MINIMAL_WELLFIELD).unwrap();
        match &mut scenario.agents {
            AgentSpec::Farmers { wells } => wells[0].row = 9,
            _ => unreachable!(),
        }
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::Validation(_))
        ));
    }

    #[test]
    fn tiny_grid_fails_validation() {
        let mut scenario: Scenario = serde_yaml::from_str(MINIMAL_WELLFIELD).unwrap();
        scenario.grid.rows = 2;
        assert!(scenario.validate().is_err());
    }

    #[test]
    fn build_model_is_deterministic_for_grazing_placement() {
        let yaml = r#"
name: herd
seed: 21
grid:
  rows: 8
  cols: 8
  spacing_m: 10.0
land:
  kind: soil_creep
  diffusivity_m2_per_year: 50.0
  cover_damping: 0.8
  relief_m: 12.0
agents:
  kind: grazing
  initial_sheep: 6
  initial_wolves: 2
"#;
        let scenario: Scenario = serde_yaml::from_str(yaml).unwrap();
        scenario.validate().unwrap();
        let a = scenario.build_model().unwrap();
        let b = scenario.build_model().unwrap();
        let markers_a: Vec<_> = a
            .agents()
            .markers()
            .iter()
            .map(|m| (m.row, m.col))
            .collect();
        let markers_b: Vec<_> = b
            .agents()
            .markers()
            .iter()
            .map(|m| (m.row, m.col))
            .collect();
        assert_eq!(markers_a, markers_b);
    }
}
