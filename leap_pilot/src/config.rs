//! Application configuration, loaded from TOML and overridden by CLI flags.
//!
//! ```toml
//! sensor    = "sim"          # or "leap"
//! null_link = false
//! auto_link = false
//!
//! [pilot.mapping]
//! dead_zone   = 0.5
//! yaw_limit   = 200.0
//!
//! [pilot.transmit]
//! period_ms = 10
//!
//! [link]
//! target = "127.0.0.1:1212"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pilot_core::{PilotConfig, ScreenProjector};
use pilot_link::LinkConfig;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorMode {
    /// Mouse-driven simulator in the visualizer window.
    #[default]
    Sim,
    /// LeapMotion controller (needs the `leap` feature).
    Leap,
}

/// Configuration for the full application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sensor:          SensorMode,
    pub pilot:           PilotConfig,
    pub link:            LinkConfig,
    /// Discard setpoints instead of sending them.
    pub null_link:       bool,
    /// Start the link as soon as the window opens.
    pub auto_link:       bool,
    /// Maps Leap palm millimetres onto the camera view.
    pub leap_projection: ScreenProjector,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            sensor:          SensorMode::Sim,
            pilot:           PilotConfig::default(),
            link:            LinkConfig::default(),
            null_link:       false,
            auto_link:       false,
            leap_projection: ScreenProjector::new(1.5, 380.0, 700.0),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("could not parse {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pilot_core::{Point2, Point3, Projector};
    use std::io::Write;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(AppConfig::from_toml("").unwrap(), AppConfig::default());
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let cfg = AppConfig::from_toml(
            "sensor = \"leap\"\n[pilot.mapping]\nyaw_limit = 90.0\n[link]\ntarget = \"10.0.0.2:1212\"\n",
        ).unwrap();
        assert_eq!(cfg.sensor, SensorMode::Leap);
        assert_eq!(cfg.pilot.mapping.yaw_limit, 90.0);
        assert_eq!(cfg.pilot.mapping.dead_zone, 0.5);
        assert_eq!(cfg.pilot.transmit.period_ms, 10);
        assert_eq!(cfg.link.target, "10.0.0.2:1212");
        assert_eq!(cfg.link.write_timeout_ms, 5);
    }

    #[test]
    fn unit_leap_projection_keeps_y_flip() {
        let cfg = AppConfig::from_toml(
            "[leap_projection]\nscale = 1.0\norigin_x = 0.0\norigin_y = 0.0\n",
        ).unwrap();
        assert!(cfg.leap_projection.flip_y);
        let p = cfg.leap_projection.project(Point3::new(10.0, 50.0, 0.0));
        assert_eq!(p, Point2::new(10.0, -50.0));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "auto_link = true\n[pilot.transmit]\nperiod_ms = 20").unwrap();
        let cfg = AppConfig::load(file.path()).unwrap();
        assert!(cfg.auto_link);
        assert_eq!(cfg.pilot.transmit.period_ms, 20);
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn bad_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sensor = \"sonar\"").unwrap();
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("could not parse"));
    }
}
