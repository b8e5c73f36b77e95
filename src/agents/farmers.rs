//! Farmers with groundwater wells at fixed cells.
//!
//! Each step a farmer reads the depth to the water table at its own cell and
//! pumps only while the table is shallower than its well: observed depth at
//! or below the well bottom switches the pump off in that same step.

use anyhow::Result;
use rand::seq::SliceRandom;

use crate::{
    agents::AgentKind,
    coupling::{AgentMarker, AgentModel, Census, KindCount},
    grid::{GridError, ScalarField},
    rng::StreamRng,
};

#[derive(Debug, Clone)]
pub struct Farmer {
    pub id: u32,
    pub row: usize,
    pub col: usize,
    pub well_depth_m: f64,
    pub pump_rate_m3_per_day: f64,
    pub pumping: bool,
}

pub struct FarmerPopulation {
    rows: usize,
    cols: usize,
    farmers: Vec<Farmer>,
}

impl FarmerPopulation {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            farmers: Vec::new(),
        }
    }

    /// Place a farmer; wells start pumping and shut off on first observation
    /// of a dry well.
    pub fn place(
        &mut self,
        row: usize,
        col: usize,
        well_depth_m: f64,
        pump_rate_m3_per_day: f64,
    ) -> Result<u32, GridError> {
        if row >= self.rows || col >= self.cols {
            return Err(GridError::OutOfBounds {
                rows: self.rows,
                cols: self.cols,
                row,
                col,
            });
        }
        let id = self.farmers.len() as u32;
        self.farmers.push(Farmer {
            id,
            row,
            col,
            well_depth_m,
            pump_rate_m3_per_day,
            pumping: true,
        });
        Ok(id)
    }

    pub fn farmers(&self) -> &[Farmer] {
        &self.farmers
    }
}

impl AgentModel for FarmerPopulation {
    fn name(&self) -> &'static str {
        "farmers"
    }

    fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn step(&mut self, observation: &ScalarField, rng: &mut StreamRng<'_>) -> Result<()> {
        let mut order: Vec<usize> = (0..self.farmers.len()).collect();
        order.shuffle(rng);
        for index in order {
            let farmer = &mut self.farmers[index];
            let depth = observation.get(farmer.row, farmer.col);
            farmer.pumping = depth < farmer.well_depth_m;
        }
        Ok(())
    }

    /// Volumetric extraction per cell, m^3/day, summed over active wells.
    fn aggregate(&self) -> ScalarField {
        let mut extraction = ScalarField::zeros(self.rows, self.cols);
        for farmer in &self.farmers {
            if farmer.pumping {
                let current = extraction.get(farmer.row, farmer.col);
                extraction.set(
                    farmer.row,
                    farmer.col,
                    current + farmer.pump_rate_m3_per_day,
                );
            }
        }
        extraction
    }

    fn census(&self) -> Census {
        let pumping = self.farmers.iter().filter(|f| f.pumping).count() as u64;
        Census {
            total: self.farmers.len() as u64,
            active: pumping,
            kinds: vec![KindCount {
                kind: AgentKind::Farmer.label(),
                count: self.farmers.len() as u64,
            }],
        }
    }

    fn markers(&self) -> Vec<AgentMarker> {
        self.farmers
            .iter()
            .map(|farmer| AgentMarker {
                kind: AgentKind::Farmer.label(),
                row: farmer.row,
                col: farmer.col,
                active: farmer.pumping,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RngManager;

    #[test]
    fn placement_outside_the_grid_is_rejected() {
        let mut population = FarmerPopulation::new(3, 3);
        assert!(population.place(1, 1, 5.0, 100.0).is_ok());
        assert!(matches!(
            population.place(3, 0, 5.0, 100.0),
            Err(GridError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn deep_water_table_shuts_the_pump_off() {
        let mut population = FarmerPopulation::new(3, 3);
        population.place(1, 1, 5.0, 100.0).unwrap();
        let mut rng = RngManager::new(0);

        let dry = ScalarField::filled(3, 3, 6.0);
        population.step(&dry, &mut rng.stream("farmers")).unwrap();
        assert!(!population.farmers()[0].pumping);

        let wet = ScalarField::filled(3, 3, 4.0);
        population.step(&wet, &mut rng.stream("farmers")).unwrap();
        assert!(population.farmers()[0].pumping);
    }

    #[test]
    fn depth_exactly_at_well_bottom_counts_as_dry() {
        let mut population = FarmerPopulation::new(3, 3);
        population.place(1, 1, 5.0, 100.0).unwrap();
        let mut rng = RngManager::new(0);
        let at_limit = ScalarField::filled(3, 3, 5.0);
        population
            .step(&at_limit, &mut rng.stream("farmers"))
            .unwrap();
        assert!(!population.farmers()[0].pumping);
    }

    #[test]
    fn aggregate_sums_co_located_wells() {
        let mut population = FarmerPopulation::new(3, 3);
        population.place(1, 1, 5.0, 100.0).unwrap();
        population.place(1, 1, 5.0, 250.0).unwrap();
        population.place(0, 2, 5.0, 50.0).unwrap();
        let extraction = population.aggregate();
        assert_eq!(extraction.get(1, 1), 350.0);
        assert_eq!(extraction.get(0, 2), 50.0);
        assert_eq!(extraction.total(), 400.0);
    }
}
