use std::path::PathBuf;

use coevolve::{
    engine::{Engine, EngineSettings},
    scenario::ScenarioLoader,
};

fn scenario_loader() -> ScenarioLoader {
    ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
}

fn build_engine(name: &str, seed: u64, snapshot_dir: PathBuf, snapshot_interval: u64) -> Engine {
    Engine::new(EngineSettings {
        scenario_name: name.into(),
        seed,
        snapshot_interval_steps: snapshot_interval,
        snapshot_dir,
    })
}

#[test]
fn wellfield_runs_deterministically() {
    let scenario = scenario_loader()
        .load("scenarios/wellfield.yaml")
        .expect("scenario should load");
    let steps = 30;

    let mut model_a = scenario.build_model().unwrap();
    let mut engine_a = build_engine(&scenario.name, scenario.seed, PathBuf::from("unused"), 0);
    engine_a.run(&mut model_a, steps).unwrap();

    let mut model_b = scenario.build_model().unwrap();
    let mut engine_b = build_engine(&scenario.name, scenario.seed, PathBuf::from("unused"), 0);
    engine_b.run(&mut model_b, steps).unwrap();

    assert_eq!(
        model_a.land().state_field().values(),
        model_b.land().state_field().values()
    );
    assert_eq!(
        model_a.agents().census().active,
        model_b.agents().census().active
    );
}

#[test]
fn grazing_slope_runs_deterministically() {
    let scenario = scenario_loader()
        .load("scenarios/grazing_slope.yaml")
        .expect("scenario should load");
    let steps = 40;

    let mut model_a = scenario.build_model().unwrap();
    let mut engine_a = build_engine(&scenario.name, scenario.seed, PathBuf::from("unused"), 0);
    engine_a.run(&mut model_a, steps).unwrap();

    let mut model_b = scenario.build_model().unwrap();
    let mut engine_b = build_engine(&scenario.name, scenario.seed, PathBuf::from("unused"), 0);
    engine_b.run(&mut model_b, steps).unwrap();

    let positions = |model: &coevolve::CoupledModel| {
        let mut m: Vec<_> = model
            .agents()
            .markers()
            .iter()
            .map(|marker| (marker.kind, marker.row, marker.col))
            .collect();
        m.sort();
        m
    };
    assert_eq!(positions(&model_a), positions(&model_b));
    assert_eq!(
        model_a.land().state_field().values(),
        model_b.land().state_field().values()
    );
}

#[test]
fn engine_emits_snapshots_at_the_configured_interval() {
    let scenario = scenario_loader()
        .load("scenarios/wellfield.yaml")
        .unwrap();
    let temp = tempfile::tempdir().unwrap();
    let snapshot_dir = temp.path().join("snaps");

    let mut model = scenario.build_model().unwrap();
    let mut engine = build_engine(&scenario.name, scenario.seed, snapshot_dir.clone(), 10);
    engine.run(&mut model, 30).unwrap();

    let expected = snapshot_dir.join("wellfield").join("step_000010.json");
    assert!(
        expected.exists(),
        "expected snapshot {} to exist",
        expected.display()
    );
    let data = std::fs::read_to_string(expected).unwrap();
    assert!(
        data.contains("\"scenario\": \"wellfield\""),
        "snapshot should carry scenario metadata"
    );
}

#[test]
fn engine_runs_hook_each_step() {
    let scenario = scenario_loader()
        .load("scenarios/wellfield.yaml")
        .unwrap();
    let mut model = scenario.build_model().unwrap();
    let temp = tempfile::tempdir().unwrap();
    let mut engine = build_engine(&scenario.name, scenario.seed, temp.path().to_path_buf(), 0);

    let mut steps_seen = Vec::new();
    engine
        .run_with_hook(&mut model, 6, |_, summary| steps_seen.push(summary.step))
        .expect("run succeeds");

    assert_eq!(steps_seen, vec![1, 2, 3, 4, 5, 6]);
}
