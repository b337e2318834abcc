//! Input-device packet layout.

use serde::{Deserialize, Serialize};

use pilot_core::ControlSample;

use crate::Result;

/// Protocol version the ground client expects.
pub const PACKET_VERSION: u32 = 1;

pub const DEFAULT_CLIENT_NAME: &str = "ZMQ Client";

/// Flight control inputs.  Roll/pitch in degrees, yaw in deg/s, thrust in percent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlPacket {
    pub roll:   f64,
    pub pitch:  f64,
    pub yaw:    f64,
    pub thrust: f64,
    pub estop:  bool,
    pub alt1:   bool,
    pub alt2:   bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputPacket {
    pub version:     u32,
    pub client_name: String,
    pub ctrl:        ControlPacket,
}

impl InputPacket {
    pub fn from_sample(sample: &ControlSample) -> Self {
        InputPacket::with_client(sample, DEFAULT_CLIENT_NAME)
    }

    pub fn with_client(sample: &ControlSample, client_name: &str) -> Self {
        InputPacket {
            version:     PACKET_VERSION,
            client_name: client_name.to_string(),
            ctrl: ControlPacket {
                roll:   sample.roll,
                pitch:  sample.pitch,
                yaw:    sample.yaw,
                thrust: clamp_thrust(sample.thrust),
                estop:  sample.estop,
                alt1:   sample.aux1,
                alt2:   sample.aux2,
            },
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Keep thrust in `[0, 100]`; NaN becomes 0.
fn clamp_thrust(t: f64) -> f64 {
    if t.is_nan() { 0.0 } else { t.clamp(0.0, 100.0) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn json(sample: &ControlSample) -> Value {
        serde_json::from_slice(&InputPacket::from_sample(sample).to_bytes().unwrap()).unwrap()
    }

    #[test]
    fn layout_matches_client_protocol() {
        let v = json(&ControlSample { thrust: 42.0, yaw: -10.0, pitch: 3.5, roll: 1.0, estop: false, aux1: true, aux2: false });
        assert_eq!(v["version"], 1);
        assert_eq!(v["client_name"], "ZMQ Client");
        assert_eq!(v["ctrl"]["thrust"], 42.0);
        assert_eq!(v["ctrl"]["yaw"], -10.0);
        assert_eq!(v["ctrl"]["pitch"], 3.5);
        assert_eq!(v["ctrl"]["roll"], 1.0);
        assert_eq!(v["ctrl"]["alt1"], true);
        assert_eq!(v["ctrl"]["estop"], false);
    }

    #[test]
    fn thrust_is_clamped() {
        assert_eq!(json(&ControlSample { thrust: 150.0, ..ControlSample::default() })["ctrl"]["thrust"], 100.0);
        assert_eq!(json(&ControlSample { thrust: -20.0, ..ControlSample::default() })["ctrl"]["thrust"], 0.0);
        assert_eq!(InputPacket::from_sample(&ControlSample { thrust: f64::NAN, ..ControlSample::default() }).ctrl.thrust, 0.0);
    }

    #[test]
    fn other_axes_pass_through_unclamped() {
        let p = InputPacket::from_sample(&ControlSample { yaw: -200.0, ..ControlSample::default() });
        assert_eq!(p.ctrl.yaw, -200.0);
    }

    #[test]
    fn custom_client_name() {
        let p = InputPacket::with_client(&ControlSample::default(), "pilot");
        assert_eq!(p.client_name, "pilot");
    }
}
