use std::fs;

use grab_place::sim::{Scenario, Simulation};
use grab_place::ControllerConfig;
use tempfile::TempDir;

#[test]
fn test_scenario_file_round_trip_through_facade() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("drop.toml");
    fs::write(
        &path,
        r#"
name = "short drop"
ticks = 80

[start]
x = 0.0
y = 1.0
z = 0.0

[floor]
fallback_height = -0.3
"#,
    )
    .unwrap();

    let mut sim = Simulation::new(Scenario::load(&path).unwrap()).unwrap();
    sim.run();
    let report = sim.finish();
    assert_eq!(report.frames.last().unwrap().target_centimeters, 70);
    assert_eq!(report.final_pose.y, 0.7);
}

#[test]
fn test_config_written_and_reloaded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("controller.toml");
    let config = ControllerConfig {
        confidence_threshold: 0.75,
        max_planes: 8,
        ..ControllerConfig::default()
    };
    fs::write(&path, config.to_toml_string().unwrap()).unwrap();
    assert_eq!(ControllerConfig::load(&path).unwrap(), config);
}
