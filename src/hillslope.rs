//! Linear soil creep on a hillslope.
//!
//! Solves `dz/dt = div(D_eff grad z)` explicitly, where the effective
//! diffusivity is the bare-soil value damped by the vegetation cover field
//! supplied by the agent side: `D_eff = D * (1 - damping * cover)`. The
//! outer cell ring holds a fixed elevation.

use anyhow::Result;

use crate::{
    coupling::LandModel,
    grid::{GridError, RasterGrid, ScalarField},
};

const STABILITY_SAFETY: f64 = 0.8;
const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone)]
pub struct SoilCreepParams {
    pub diffusivity_m2_per_year: f64,
    /// Fraction of the diffusivity removed under full vegetation cover, 0..1.
    pub cover_damping: f64,
    /// Height of the initial ridge above the domain edges.
    pub relief_m: f64,
}

pub struct SoilCreepModel {
    grid: RasterGrid,
    diffusivity: f64,
    cover_damping: f64,
    elevation: ScalarField,
    /// Vegetation cover per cell, 0..1. Forcing input.
    cover: ScalarField,
    scratch: ScalarField,
}

impl SoilCreepModel {
    /// Starts from a ridge running across the domain, crest at mid-row.
    pub fn new(grid: RasterGrid, params: SoilCreepParams) -> Self {
        let (rows, cols) = grid.shape();
        let crest = (rows.saturating_sub(1)) as f64;
        let elevation = ScalarField::from_fn(rows, cols, |row, _col| {
            let phase = std::f64::consts::PI * row as f64 / crest.max(1.0);
            params.relief_m * phase.sin()
        });
        Self {
            grid,
            diffusivity: params.diffusivity_m2_per_year,
            cover_damping: params.cover_damping.clamp(0.0, 1.0),
            scratch: elevation.clone(),
            elevation,
            cover: ScalarField::zeros(rows, cols),
        }
    }

    pub fn grid(&self) -> &RasterGrid {
        &self.grid
    }

    pub fn elevation(&self) -> &ScalarField {
        &self.elevation
    }

    fn effective_diffusivity(&self, row: usize, col: usize) -> f64 {
        self.diffusivity * (1.0 - self.cover_damping * self.cover.get(row, col))
    }

    /// Steepest 4-neighbor gradient magnitude at each cell, m/m.
    pub fn slope(&self) -> ScalarField {
        let (rows, cols) = self.grid.shape();
        let dx = self.grid.spacing_m();
        ScalarField::from_fn(rows, cols, |row, col| {
            let z = self.elevation.get(row, col);
            self.grid
                .neighbors4(row, col)
                .into_iter()
                .map(|(nr, nc)| ((self.elevation.get(nr, nc) - z) / dx).abs())
                .fold(0.0, f64::max)
        })
    }

    fn stable_substep_days(&self, dt_days: f64) -> (usize, f64) {
        let dx2 = self.grid.cell_area_m2();
        let max_step_years = STABILITY_SAFETY * 0.25 * dx2 / self.diffusivity.max(1e-12);
        let dt_years = dt_days / DAYS_PER_YEAR;
        let substeps = (dt_years / max_step_years).ceil().max(1.0) as usize;
        (substeps, dt_years / substeps as f64)
    }
}

impl LandModel for SoilCreepModel {
    fn name(&self) -> &'static str {
        "soil_creep"
    }

    fn shape(&self) -> (usize, usize) {
        self.grid.shape()
    }

    fn advance(&mut self, dt_days: f64) -> Result<()> {
        let (rows, cols) = self.grid.shape();
        let dx2 = self.grid.cell_area_m2();
        let (substeps, sub_dt_years) = self.stable_substep_days(dt_days);

        for _ in 0..substeps {
            for row in 0..rows {
                for col in 0..cols {
                    if self.grid.is_edge(row, col) {
                        self.scratch.set(row, col, self.elevation.get(row, col));
                        continue;
                    }
                    let z = self.elevation.get(row, col);
                    let d_here = self.effective_diffusivity(row, col);
                    // Flux-form update with face diffusivities averaged
                    // between adjacent cells.
                    let mut divergence = 0.0;
                    for (nr, nc) in [
                        (row - 1, col),
                        (row + 1, col),
                        (row, col - 1),
                        (row, col + 1),
                    ] {
                        let d_face = 0.5 * (d_here + self.effective_diffusivity(nr, nc));
                        divergence += d_face * (self.elevation.get(nr, nc) - z);
                    }
                    self.scratch
                        .set(row, col, z + divergence / dx2 * sub_dt_years);
                }
            }
            std::mem::swap(&mut self.elevation, &mut self.scratch);
        }
        Ok(())
    }

    fn observe(&self) -> ScalarField {
        self.slope()
    }

    /// Forcing semantics: vegetation cover fraction per cell, 0..1.
    fn apply_forcing(&mut self, forcing: &ScalarField) -> Result<(), GridError> {
        let (rows, cols) = self.grid.shape();
        forcing.ensure_shape(rows, cols)?;
        for (dst, src) in self.cover.values_mut().iter_mut().zip(forcing.values()) {
            *dst = src.clamp(0.0, 1.0);
        }
        Ok(())
    }

    fn state_field(&self) -> &ScalarField {
        &self.elevation
    }

    fn state_label(&self) -> &'static str {
        "elevation_m"
    }
}
