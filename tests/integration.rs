use std::fs;
use std::process::Command;

use forcelattice::generator::{self, INPUT_COUNT, OUTPUT_COUNT};
use forcelattice::surface::DrawCommand;
use forcelattice::{Color, Config, DrawList, World};

#[test]
fn locked_anchors_hold_still_for_a_hundred_updates() {
    let world = World::default();
    generator::seed_anchors(&world);
    let before = world.nodes();
    assert_eq!(before.len(), INPUT_COUNT + OUTPUT_COUNT);

    for _ in 0..100 {
        world.update();
    }

    assert_eq!(world.frames(), 100);
    for (start, end) in before.iter().zip(world.nodes()) {
        assert_eq!(start.location, end.location);
    }
}

#[test]
fn grown_graph_settles_and_draws() {
    let world = World::default();
    generator::seed_anchors(&world);
    let mut rng = rand::thread_rng();
    generator::populate(
        &world,
        &mut rng,
        &Config::default().growth.bulk,
        Color::from_rgb(0, 63, 63),
    )
    .expect("Failed to populate");

    for _ in 0..200 {
        world.update();
    }
    for node in world.nodes() {
        assert!(node.location.magnitude().is_finite());
        assert!(node.location.magnitude() < 5000.0, "{}", node.location);
    }

    let mut surface = DrawList::new(800, 600);
    world.draw(&mut surface, true);
    let lines = surface
        .commands()
        .iter()
        .filter(|c| matches!(c, DrawCommand::Line { .. }))
        .count();
    assert_eq!(lines, world.edge_count());
}

#[test]
fn prints_default_configuration() {
    let output = Command::new(env!("CARGO_BIN_EXE_forcelattice"))
        .arg("config")
        .output()
        .expect("Failed to execute forcelattice");

    assert!(output.status.success(), "forcelattice exited with error");

    let yaml = String::from_utf8(output.stdout).expect("Output was not UTF-8");
    let config = Config::from_yaml_str(&yaml).expect("Printed config did not parse");
    assert_eq!(config, Config::default());
}

#[test]
fn config_file_overrides_defaults() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("lattice.yaml");
    fs::write(&path, "physics:\n  theta: 0.25\n").expect("Failed to write config");

    let output = Command::new(env!("CARGO_BIN_EXE_forcelattice"))
        .args(["config", "--config", path.to_str().unwrap()])
        .output()
        .expect("Failed to execute forcelattice");

    assert!(output.status.success(), "forcelattice exited with error");
    let yaml = String::from_utf8(output.stdout).expect("Output was not UTF-8");
    let config = Config::from_yaml_str(&yaml).expect("Printed config did not parse");
    assert_eq!(config.physics.theta, 0.25);
}

#[test]
fn bench_reports_each_size_as_json() {
    let output = Command::new(env!("CARGO_BIN_EXE_forcelattice"))
        .args(["bench", "--nodes", "50", "100", "--json"])
        .output()
        .expect("Failed to execute forcelattice");

    assert!(output.status.success(), "forcelattice exited with error");

    let results: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Output was not JSON");
    let sizes: Vec<u64> = results
        .as_array()
        .expect("Expected an array")
        .iter()
        .map(|r| r["nodes"].as_u64().unwrap())
        .collect();
    assert_eq!(sizes, vec![50, 100]);
}

#[test]
fn headless_run_shuts_down_cleanly() {
    let output = Command::new(env!("CARGO_BIN_EXE_forcelattice"))
        .args(["run", "--seconds", "1", "--no-growth"])
        .output()
        .expect("Failed to execute forcelattice");

    assert!(output.status.success(), "forcelattice exited with error");
    let stdout = String::from_utf8(output.stdout).expect("Output was not UTF-8");
    assert!(stdout.contains("Nodes    17"), "{stdout}");
}
