//! Grass, sheep, and wolves on an eroding hillslope.
//!
//! One grass patch per cell regrows on a countdown that only runs where the
//! observed slope is below the stability threshold; unstable ground resets
//! the countdown. Sheep graze grown patches, wolves hunt sheep; both move to
//! a random neighbor each activation, spend energy, reproduce by chance, and
//! starve at zero energy.

use anyhow::Result;
use rand::{seq::SliceRandom, Rng};

use crate::{
    agents::AgentKind,
    coupling::{AgentMarker, AgentModel, Census, KindCount},
    grid::{GridError, ScalarField},
    rng::StreamRng,
};

#[derive(Debug, Clone)]
pub struct GrazingParams {
    pub regrowth_steps: u32,
    /// Slope (m/m) at and above which a patch cannot regrow.
    pub slope_limit: f64,
    pub sheep_gain_from_food: f64,
    pub wolf_gain_from_food: f64,
    pub sheep_reproduce_chance: f64,
    pub wolf_reproduce_chance: f64,
    pub initial_energy: f64,
}

#[derive(Debug, Clone)]
pub struct GrassPatch {
    pub fully_grown: bool,
    pub countdown: u32,
}

#[derive(Debug, Clone)]
pub struct Critter {
    pub id: u32,
    pub row: usize,
    pub col: usize,
    pub energy: f64,
}

pub struct GrazingPopulation {
    rows: usize,
    cols: usize,
    params: GrazingParams,
    grass: Vec<GrassPatch>,
    sheep: Vec<Critter>,
    wolves: Vec<Critter>,
    next_id: u32,
}

impl GrazingPopulation {
    /// All patches start fully grown; herds are placed separately.
    pub fn new(rows: usize, cols: usize, params: GrazingParams) -> Self {
        let grass = vec![
            GrassPatch {
                fully_grown: true,
                countdown: params.regrowth_steps,
            };
            rows * cols
        ];
        Self {
            rows,
            cols,
            params,
            grass,
            sheep: Vec::new(),
            wolves: Vec::new(),
            next_id: 0,
        }
    }

    pub fn place_sheep(&mut self, row: usize, col: usize) -> Result<u32, GridError> {
        let critter = self.make_critter(row, col)?;
        let id = critter.id;
        self.sheep.push(critter);
        Ok(id)
    }

    pub fn place_wolf(&mut self, row: usize, col: usize) -> Result<u32, GridError> {
        let critter = self.make_critter(row, col)?;
        let id = critter.id;
        self.wolves.push(critter);
        Ok(id)
    }

    fn make_critter(&mut self, row: usize, col: usize) -> Result<Critter, GridError> {
        if row >= self.rows || col >= self.cols {
            return Err(GridError::OutOfBounds {
                rows: self.rows,
                cols: self.cols,
                row,
                col,
            });
        }
        let id = self.next_id;
        self.next_id += 1;
        Ok(Critter {
            id,
            row,
            col,
            energy: self.params.initial_energy,
        })
    }

    pub fn grass(&self, row: usize, col: usize) -> &GrassPatch {
        &self.grass[row * self.cols + col]
    }

    pub fn sheep(&self) -> &[Critter] {
        &self.sheep
    }

    pub fn wolves(&self) -> &[Critter] {
        &self.wolves
    }

    fn grown_patches(&self) -> u64 {
        self.grass.iter().filter(|p| p.fully_grown).count() as u64
    }

    fn step_grass(&mut self, observation: &ScalarField) {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let patch = &mut self.grass[row * self.cols + col];
                if patch.fully_grown {
                    continue;
                }
                if observation.get(row, col) >= self.params.slope_limit {
                    // Ground too unstable to regrow; start over once it settles.
                    patch.countdown = self.params.regrowth_steps;
                    continue;
                }
                patch.countdown = patch.countdown.saturating_sub(1);
                if patch.countdown == 0 {
                    patch.fully_grown = true;
                    patch.countdown = self.params.regrowth_steps;
                }
            }
        }
    }

    fn random_move(&self, critter: &Critter, rng: &mut StreamRng<'_>) -> (usize, usize) {
        let mut options = Vec::with_capacity(4);
        if critter.row > 0 {
            options.push((critter.row - 1, critter.col));
        }
        if critter.row + 1 < self.rows {
            options.push((critter.row + 1, critter.col));
        }
        if critter.col > 0 {
            options.push((critter.row, critter.col - 1));
        }
        if critter.col + 1 < self.cols {
            options.push((critter.row, critter.col + 1));
        }
        *options.choose(rng).unwrap_or(&(critter.row, critter.col))
    }

    fn step_sheep(&mut self, rng: &mut StreamRng<'_>) {
        let mut order: Vec<usize> = (0..self.sheep.len()).collect();
        order.shuffle(rng);
        let mut lambs = Vec::new();
        for index in order {
            let (row, col) = self.random_move(&self.sheep[index], rng);
            let sheep = &mut self.sheep[index];
            sheep.row = row;
            sheep.col = col;
            sheep.energy -= 1.0;

            let patch = &mut self.grass[row * self.cols + col];
            if patch.fully_grown {
                patch.fully_grown = false;
                patch.countdown = self.params.regrowth_steps;
                self.sheep[index].energy += self.params.sheep_gain_from_food;
            }

            let sheep = &mut self.sheep[index];
            if sheep.energy > 0.0 && rng.gen::<f64>() < self.params.sheep_reproduce_chance {
                sheep.energy /= 2.0;
                lambs.push((row, col, sheep.energy));
            }
        }
        self.sheep.retain(|s| s.energy > 0.0);
        for (row, col, energy) in lambs {
            let id = self.next_id;
            self.next_id += 1;
            self.sheep.push(Critter {
                id,
                row,
                col,
                energy,
            });
        }
    }

    fn step_wolves(&mut self, rng: &mut StreamRng<'_>) {
        let mut order: Vec<usize> = (0..self.wolves.len()).collect();
        order.shuffle(rng);
        let mut pups = Vec::new();
        for index in order {
            let (row, col) = self.random_move(&self.wolves[index], rng);
            let wolf = &mut self.wolves[index];
            wolf.row = row;
            wolf.col = col;
            wolf.energy -= 1.0;

            if let Some(prey) = self
                .sheep
                .iter()
                .position(|s| s.row == row && s.col == col)
            {
                self.sheep.swap_remove(prey);
                self.wolves[index].energy += self.params.wolf_gain_from_food;
            }

            let wolf = &mut self.wolves[index];
            if wolf.energy > 0.0 && rng.gen::<f64>() < self.params.wolf_reproduce_chance {
                wolf.energy /= 2.0;
                pups.push((row, col, wolf.energy));
            }
        }
        self.wolves.retain(|w| w.energy > 0.0);
        for (row, col, energy) in pups {
            let id = self.next_id;
            self.next_id += 1;
            self.wolves.push(Critter {
                id,
                row,
                col,
                energy,
            });
        }
    }
}

impl AgentModel for GrazingPopulation {
    fn name(&self) -> &'static str {
        "grazing"
    }

    fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn step(&mut self, observation: &ScalarField, rng: &mut StreamRng<'_>) -> Result<()> {
        self.step_grass(observation);
        self.step_sheep(rng);
        self.step_wolves(rng);
        Ok(())
    }

    /// Vegetation cover per cell: 1.0 where the patch is fully grown.
    fn aggregate(&self) -> ScalarField {
        let mut cover = ScalarField::zeros(self.rows, self.cols);
        for row in 0..self.rows {
            for col in 0..self.cols {
                if self.grass[row * self.cols + col].fully_grown {
                    cover.set(row, col, 1.0);
                }
            }
        }
        cover
    }

    fn census(&self) -> Census {
        let grown = self.grown_patches();
        Census {
            total: self.grass.len() as u64 + self.sheep.len() as u64 + self.wolves.len() as u64,
            active: grown,
            kinds: vec![
                KindCount {
                    kind: AgentKind::Grass.label(),
                    count: grown,
                },
                KindCount {
                    kind: AgentKind::Sheep.label(),
                    count: self.sheep.len() as u64,
                },
                KindCount {
                    kind: AgentKind::Wolf.label(),
                    count: self.wolves.len() as u64,
                },
            ],
        }
    }

    fn markers(&self) -> Vec<AgentMarker> {
        let mut markers = Vec::with_capacity(self.sheep.len() + self.wolves.len());
        for sheep in &self.sheep {
            markers.push(AgentMarker {
                kind: AgentKind::Sheep.label(),
                row: sheep.row,
                col: sheep.col,
                active: true,
            });
        }
        for wolf in &self.wolves {
            markers.push(AgentMarker {
                kind: AgentKind::Wolf.label(),
                row: wolf.row,
                col: wolf.col,
                active: true,
            });
        }
        markers
    }
}
