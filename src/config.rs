//! Configuration for the layout, renderer and simulation drivers
//!
//! Every tunable lives here and can be loaded from YAML. Each section is
//! `#[serde(default)]`, so a file only needs to name the values it changes:
//!
//! ```yaml
//! physics:
//!   theta: 0.3
//!   edge_length: 45.0
//! timing:
//!   update_ms: 10
//! growth:
//!   bulk_seed: true
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::Result;
use crate::node::DEFAULT_DAMPENING;
use crate::octree::{
    DEFAULT_REPULSION_EPSILON, DEFAULT_REPULSION_FACTOR, DEFAULT_THETA, RepulsionParams,
};
use crate::vector::Vector;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub physics: PhysicsConfig,
    pub renderer: RendererConfig,
    pub timing: TimingConfig,
    pub growth: GrowthConfig,
}

/// Force model constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Barnes-Hut opening threshold; 0 is exact
    pub theta: f64,
    pub repulsion_factor: f64,
    pub repulsion_epsilon: f64,
    pub origin_factor: f64,
    pub origin_epsilon: f64,
    /// Inside this radius origin attraction fades linearly to zero
    pub origin_weak_distance: f64,
    pub edge_factor: f64,
    /// Rest length of a spring, on top of both node radii
    pub edge_length: f64,
    pub dampening: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            theta: DEFAULT_THETA,
            repulsion_factor: DEFAULT_REPULSION_FACTOR,
            repulsion_epsilon: DEFAULT_REPULSION_EPSILON,
            origin_factor: 2e4,
            origin_epsilon: 7000.0,
            origin_weak_distance: 100.0,
            edge_factor: 0.1,
            edge_length: 30.0,
            dampening: DEFAULT_DAMPENING,
        }
    }
}

impl PhysicsConfig {
    pub fn repulsion(&self) -> RepulsionParams {
        RepulsionParams {
            theta: self.theta,
            factor: self.repulsion_factor,
            epsilon: self.repulsion_epsilon,
        }
    }
}

/// Camera, lens and lighting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Lens position; `fov` and this z fix the projection scale
    pub camera: Vector,
    pub fov: f64,
    /// Eye z the world starts zoomed to
    pub initial_camera_z: f64,
    /// Applied to mouse wheel deltas
    pub camera_z_acceleration: f64,
    /// Per-tick decay of the zoom velocity
    pub camera_z_easing: f64,
    pub light: Option<Vector>,
    pub lighting: bool,
    pub shadow_max: f64,
    pub shadow_contrast: f64,
    pub lighting_optimal_range: f64,
    pub lighting_multiplier: f64,
    pub show_labels: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            camera: Vector::new(0.0, 0.0, 2000.0),
            fov: 1400.0,
            initial_camera_z: 5000.0,
            camera_z_acceleration: -2e-4,
            camera_z_easing: 0.94,
            light: Some(Vector::new(0.0, 1000.0, 0.0)),
            lighting: true,
            shadow_max: 0.4,
            shadow_contrast: 0.5,
            lighting_optimal_range: 1000.0,
            lighting_multiplier: 0.5,
            show_labels: true,
        }
    }
}

/// Driver cadences, in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub update_ms: u64,
    pub draw_ms: u64,
    pub generation_ms: u64,
    pub connection_ms: u64,
    pub shutdown_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            update_ms: 20,
            draw_ms: 33,
            generation_ms: 2500,
            connection_ms: 1000,
            shutdown_timeout_ms: 3000,
        }
    }
}

impl TimingConfig {
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_ms)
    }

    pub fn draw_interval(&self) -> Duration {
        Duration::from_millis(self.draw_ms)
    }

    pub fn generation_interval(&self) -> Duration {
        Duration::from_millis(self.generation_ms)
    }

    pub fn connection_interval(&self) -> Duration {
        Duration::from_millis(self.connection_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

/// Graph seeding and background growth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Run the generation and connection drivers
    pub enabled: bool,
    /// Place the locked input/output anchors at startup
    pub anchors: bool,
    /// Build the bulk random graph at startup
    pub bulk_seed: bool,
    pub node_color: Color,
    pub bulk: BulkConfig,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            anchors: true,
            bulk_seed: false,
            node_color: Color(0xff00_3f3f),
            bulk: BulkConfig::default(),
        }
    }
}

/// Shape of the bulk random graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkConfig {
    pub basis: usize,
    pub basis_connections: usize,
    pub group: usize,
    pub outliers: usize,
    pub extra_connections: usize,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            basis: 10,
            basis_connections: 8,
            group: 20,
            outliers: 20,
            extra_connections: 5,
        }
    }
}

impl Config {
    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let config = Config::from_yaml_str(
            r#"
physics:
  theta: 0.25
timing:
  update_ms: 10
"#,
        )
        .unwrap();

        assert_eq!(config.physics.theta, 0.25);
        assert_eq!(config.physics.edge_length, 30.0);
        assert_eq!(config.timing.update_interval(), Duration::from_millis(10));
        assert_eq!(config.timing.draw_ms, 33);
        assert_eq!(config.renderer, RendererConfig::default());
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(Config::from_yaml_str("{}").unwrap(), Config::default());
    }

    #[test]
    fn yaml_round_trip() {
        let mut config = Config::default();
        config.growth.bulk_seed = true;
        config.renderer.light = None;

        let yaml = config.to_yaml().unwrap();
        assert_eq!(Config::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "growth:\n  enabled: false\n  node_color: 4278190335").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert!(!config.growth.enabled);
        assert_eq!(config.growth.node_color, Color(0xff00_00ff));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        let err = Config::from_yaml_str("physics: [1, 2").unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }

    #[test]
    fn repulsion_params_follow_physics() {
        let physics = PhysicsConfig {
            theta: 0.0,
            ..PhysicsConfig::default()
        };
        let params = physics.repulsion();
        assert_eq!(params.theta, 0.0);
        assert_eq!(params.factor, -900.0);
        assert_eq!(params.epsilon, 2.0);
    }
}
