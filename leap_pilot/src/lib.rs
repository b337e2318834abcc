//! # leap_pilot
//!
//! Hand-tracking flight controller.  The operator calibrates ten hand poses,
//! then flies with both hands: the left hand sets thrust and yaw, the right
//! hand pitch and roll.  Setpoints stream to the quadcopter ground client
//! every 10 ms.
//!
//! ## Calibration
//!
//! | Step | Operator does | Then presses |
//! |---|---|---|
//! | Search for Operator | stands alone in front of the sensor | `N` |
//! | Learn Left Hand Middle/Top/Bottom/Left/Right | holds the left hand at each pose | `N` |
//! | Learn Right Hand Middle/Top/Bottom/Left/Right | holds the right hand at each pose | `N` |
//! | Tracking... | flies | `C` to start over |
//!
//! ## Feature flags
//!
//! * (default) **Simulation mode**: the mouse places the operator's hands.
//! * `leap` **Hardware mode**: polls a real LeapMotion controller via LeapC.
//!
//! ### Keys
//!
//! | Key | Action |
//! |---|---|
//! | `N` | Next calibration step |
//! | `C` | Cancel calibration |
//! | `L` | Start/stop the link |
//! | `E` | Emergency stop flag |
//! | `1` / `2` | Aux flags |
//! | left / right mouse button | Move the simulated left / right hand |
//! | `B` | Simulated bystander in/out of frame |
//! | `U` | Simulated sensor unplug/replug |
//! | `Q` | Quit |

pub mod app;
pub mod config;
pub mod error;
pub mod sensor;
pub mod visualizer;

pub use app::{run, AppState, Command};
pub use config::{AppConfig, ConfigError, SensorMode};
pub use error::AppError;
