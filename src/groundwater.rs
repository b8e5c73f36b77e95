//! Confined-aquifer groundwater flow on the raster grid.
//!
//! Solves `S dh/dt = T laplacian(h) + R_net` with an explicit finite
//! difference scheme. The outer cell ring is a fixed-head boundary. `R_net`
//! is ambient recharge minus the per-cell extraction forcing supplied by the
//! agent side, converted from volume per cell to an equivalent head rate.

use anyhow::Result;

use crate::{
    coupling::LandModel,
    grid::{GridError, RasterGrid, ScalarField},
};

/// Fraction of the explicit stability limit used for sub-step sizing.
const STABILITY_SAFETY: f64 = 0.8;

#[derive(Debug, Clone)]
pub struct GroundwaterParams {
    pub transmissivity_m2_per_day: f64,
    pub storage_coefficient: f64,
    pub ambient_recharge_m_per_day: f64,
    pub initial_head_m: f64,
    pub boundary_head_m: f64,
    pub surface_elevation_m: f64,
}

pub struct GroundwaterModel {
    grid: RasterGrid,
    transmissivity: f64,
    storage: f64,
    ambient_recharge: f64,
    boundary_head: f64,
    surface_elevation: f64,
    head: ScalarField,
    /// Volumetric extraction per cell, m^3/day. Forcing input.
    extraction: ScalarField,
    scratch: ScalarField,
}

impl GroundwaterModel {
    pub fn new(grid: RasterGrid, params: GroundwaterParams) -> Self {
        let (rows, cols) = grid.shape();
        let mut head = ScalarField::filled(rows, cols, params.initial_head_m);
        for row in 0..rows {
            for col in 0..cols {
                if grid.is_edge(row, col) {
                    head.set(row, col, params.boundary_head_m);
                }
            }
        }
        Self {
            grid,
            transmissivity: params.transmissivity_m2_per_day,
            storage: params.storage_coefficient,
            ambient_recharge: params.ambient_recharge_m_per_day,
            boundary_head: params.boundary_head_m,
            surface_elevation: params.surface_elevation_m,
            scratch: head.clone(),
            head,
            extraction: ScalarField::zeros(rows, cols),
        }
    }

    pub fn grid(&self) -> &RasterGrid {
        &self.grid
    }

    pub fn head(&self) -> &ScalarField {
        &self.head
    }

    /// Depth from the land surface down to the water table, clamped at zero.
    pub fn depth_to_water(&self) -> ScalarField {
        let (rows, cols) = self.grid.shape();
        ScalarField::from_fn(rows, cols, |row, col| {
            (self.surface_elevation - self.head.get(row, col)).max(0.0)
        })
    }

    /// Largest stable explicit sub-step for the current parameters.
    fn stable_substep_days(&self) -> f64 {
        let dx2 = self.grid.cell_area_m2();
        let diffusivity = self.transmissivity / self.storage;
        STABILITY_SAFETY * 0.25 * dx2 / diffusivity
    }
}

impl LandModel for GroundwaterModel {
    fn name(&self) -> &'static str {
        "groundwater"
    }

    fn shape(&self) -> (usize, usize) {
        self.grid.shape()
    }

    fn advance(&mut self, dt_days: f64) -> Result<()> {
        let (rows, cols) = self.grid.shape();
        let dx2 = self.grid.cell_area_m2();
        let cell_area = self.grid.cell_area_m2();
        let substeps = (dt_days / self.stable_substep_days()).ceil().max(1.0) as usize;
        let sub_dt = dt_days / substeps as f64;

        for _ in 0..substeps {
            for row in 0..rows {
                for col in 0..cols {
                    if self.grid.is_edge(row, col) {
                        self.scratch.set(row, col, self.boundary_head);
                        continue;
                    }
                    let h = self.head.get(row, col);
                    let laplacian = (self.head.get(row - 1, col)
                        + self.head.get(row + 1, col)
                        + self.head.get(row, col - 1)
                        + self.head.get(row, col + 1)
                        - 4.0 * h)
                        / dx2;
                    let extraction_rate = self.extraction.get(row, col) / cell_area;
                    let net_recharge = self.ambient_recharge - extraction_rate;
                    let dh = (self.transmissivity * laplacian + net_recharge) / self.storage;
                    self.scratch.set(row, col, h + dh * sub_dt);
                }
            }
            std::mem::swap(&mut self.head, &mut self.scratch);
        }
        Ok(())
    }

    fn observe(&self) -> ScalarField {
        self.depth_to_water()
    }

    /// Forcing semantics: volumetric extraction per cell, m^3/day, >= 0.
    fn apply_forcing(&mut self, forcing: &ScalarField) -> Result<(), GridError> {
        let (rows, cols) = self.grid.shape();
        forcing.ensure_shape(rows, cols)?;
        for (dst, src) in self
            .extraction
            .values_mut()
            .iter_mut()
            .zip(forcing.values())
        {
            *dst = src.max(0.0);
        }
        Ok(())
    }

    fn state_field(&self) -> &ScalarField {
        &self.head
    }

    fn state_label(&self) -> &'static str {
        "head_m"
    }
}
