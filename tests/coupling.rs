//! Properties of the coupling pattern itself, independent of any particular
//! solver.

use coevolve::{
    agents::FarmerPopulation,
    coupling::{AgentModel, CoupledModel},
    grid::{RasterGrid, ScalarField},
    groundwater::{GroundwaterModel, GroundwaterParams},
    rng::RngManager,
};

fn aquifer(rows: usize, cols: usize) -> GroundwaterModel {
    GroundwaterModel::new(
        RasterGrid::new(rows, cols, 100.0),
        GroundwaterParams {
            transmissivity_m2_per_day: 250.0,
            storage_coefficient: 0.02,
            ambient_recharge_m_per_day: 0.0,
            initial_head_m: 95.0,
            boundary_head_m: 95.0,
            surface_elevation_m: 100.0,
        },
    )
}

#[test]
fn observation_matches_agent_grid_on_every_step() {
    let land = aquifer(7, 9);
    let mut agents = FarmerPopulation::new(7, 9);
    agents.place(3, 4, 6.0, 400.0).unwrap();
    let mut model = CoupledModel::new(Box::new(land), Box::new(agents), 30.0).unwrap();
    let mut rng = RngManager::new(7);

    for _ in 0..10 {
        model.step(&mut rng).unwrap();
        let observation = model.land().observe();
        let (rows, cols) = model.agents().shape();
        assert_eq!(observation.len(), rows * cols);
        assert_eq!(observation.shape(), (rows, cols));
    }
}

#[test]
fn mismatched_grids_are_rejected_at_construction() {
    let land = aquifer(5, 5);
    let agents = FarmerPopulation::new(5, 6);
    let err = CoupledModel::new(Box::new(land), Box::new(agents), 30.0).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("5x5"), "got: {message}");
    assert!(message.contains("5x6"), "got: {message}");
}

#[test]
fn threshold_crossing_flips_the_pump_flag_in_the_same_step() {
    let mut agents = FarmerPopulation::new(3, 3);
    agents.place(1, 1, 5.0, 400.0).unwrap();
    let mut rng = RngManager::new(0);

    let deep = ScalarField::filled(3, 3, 6.0);
    agents.step(&deep, &mut rng.stream("farmers")).unwrap();
    assert!(!agents.farmers()[0].pumping);

    let shallow = ScalarField::filled(3, 3, 4.0);
    agents.step(&shallow, &mut rng.stream("farmers")).unwrap();
    assert!(agents.farmers()[0].pumping);
}

#[test]
fn aggregation_without_a_step_is_idempotent() {
    let mut agents = FarmerPopulation::new(4, 4);
    agents.place(1, 2, 6.0, 300.0).unwrap();
    agents.place(2, 2, 8.0, 150.0).unwrap();
    let mut rng = RngManager::new(9);
    let observation = ScalarField::filled(4, 4, 7.0);
    agents.step(&observation, &mut rng.stream("farmers")).unwrap();

    let first = agents.aggregate();
    let second = agents.aggregate();
    assert_eq!(first, second);
}

/// The literal end-to-end scenario: a 3x3 agent grid with one farmer at
/// (1, 1) and a 5.0 m well. Observed depth 6.0 shuts the pump off within
/// one step; observed depth 4.0 turns it on.
#[test]
fn literal_three_by_three_scenario() {
    let mut agents = FarmerPopulation::new(3, 3);
    agents.place(1, 1, 5.0, 400.0).unwrap();
    let mut rng = RngManager::new(42);

    agents
        .step(&ScalarField::filled(3, 3, 6.0), &mut rng.stream("farmers"))
        .unwrap();
    assert!(!agents.farmers()[0].pumping);
    assert_eq!(agents.aggregate().total(), 0.0);

    agents
        .step(&ScalarField::filled(3, 3, 4.0), &mut rng.stream("farmers"))
        .unwrap();
    assert!(agents.farmers()[0].pumping);
    assert_eq!(agents.aggregate().get(1, 1), 400.0);
}
