//! Body-frame sources: LeapMotion hardware or mouse simulation.
//!
//! The public interface is [`SensorEvent`] delivered over a `mpsc` channel.
//! The app loop does not need to know whether frames came from real hardware
//! or from the simulator window.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use pilot_core::{Hand, JointName, Point3, TrackedBody};

// ════════════════════════════════════════════════════════════════════════════
// SensorEvent
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub enum SensorEvent {
    /// Every body the sensor reports for one frame.
    Frame(Vec<TrackedBody>),
    /// The sensor came up or went away.
    Availability(bool),
    /// The source has shut down.
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// SensorSource trait: unified interface for hw and sim
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`SensorEvent`]s over a channel.
pub trait SensorSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<SensorEvent>);
}

/// Spawn a sensor source on its own thread and return the receiving end.
pub fn spawn_sensor_source<S: SensorSource>(source: S) -> Receiver<SensorEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// LeapSensorSource: real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Sensor source backed by a LeapMotion controller.
///
/// A Leap sees hands, not skeletons, so every tracking frame with at least
/// one hand becomes a single body (id [`LEAP_BODY_ID`]) whose hand joints
/// are the palm positions in millimetres.  A frame with no hands reports
/// no bodies at all.
#[cfg(feature = "leap")]
pub struct LeapSensorSource;

/// Tracking id given to the one body a Leap controller reports.
pub const LEAP_BODY_ID: u64 = 1;

/// Consecutive failed polls (100 ms each) after which the device counts as gone.
pub const POLL_FAILURE_LIMIT: u32 = 10;

/// Turns device signals into `Availability` edges.  Starts unavailable;
/// a device event or a tracking frame brings it up, a device-lost event or
/// [`POLL_FAILURE_LIMIT`] failed polls in a row take it down.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceMonitor {
    available: bool,
    failures:  u32,
}

impl DeviceMonitor {
    pub fn is_available(&self) -> bool { self.available }

    /// A device was attached or a frame arrived.
    pub fn seen(&mut self) -> Option<SensorEvent> {
        self.failures = 0;
        self.set(true)
    }

    /// The device reported itself lost or failed.
    pub fn lost(&mut self) -> Option<SensorEvent> {
        self.failures = 0;
        self.set(false)
    }

    pub fn poll_failed(&mut self) -> Option<SensorEvent> {
        self.failures = self.failures.saturating_add(1);
        if self.failures >= POLL_FAILURE_LIMIT { self.set(false) } else { None }
    }

    fn set(&mut self, available: bool) -> Option<SensorEvent> {
        if available == self.available { return None; }
        self.available = available;
        Some(SensorEvent::Availability(available))
    }
}

#[cfg(feature = "leap")]
impl SensorSource for LeapSensorSource {
    fn run(self: Box<Self>, tx: Sender<SensorEvent>) {
        use leaprs::*;

        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c)  => c,
            Err(e) => {
                tracing::error!("could not create LeapC connection: {e:?}");
                let _ = tx.send(SensorEvent::Availability(false));
                return;
            }
        };
        if let Err(e) = connection.open() {
            tracing::error!("could not open LeapMotion device: {e:?}");
            let _ = tx.send(SensorEvent::Availability(false));
            return;
        }

        let mut monitor = DeviceMonitor::default();
        loop {
            let msg = match connection.poll(100) {
                Ok(m)  => m,
                Err(_) => {
                    if let Some(edge) = monitor.poll_failed() {
                        tracing::warn!("LeapMotion stopped responding");
                        if tx.send(edge).is_err() { return; }
                    }
                    continue;
                }
            };

            let (edge, frame) = match msg.event() {
                Event::Device(_) => (monitor.seen(), None),
                Event::DeviceLost(_) | Event::DeviceFailure(_) | Event::ConnectionLost(_) => {
                    tracing::warn!("LeapMotion device lost");
                    (monitor.lost(), None)
                }
                Event::Tracking(frame) => {
                    let mut body = TrackedBody::new(LEAP_BODY_ID);
                    let mut any = false;
                    for h in frame.hands() {
                        let joint = if h.hand_type() == HandType::Left {
                            JointName::HandLeft
                        } else {
                            JointName::HandRight
                        };
                        let p = h.palm().position();
                        body = body.with_joint(joint, Point3::new(p.x as f64, p.y as f64, p.z as f64));
                        any = true;
                    }
                    (monitor.seen(), Some(if any { vec![body] } else { Vec::new() }))
                }
                _ => (None, None),
            };

            if let Some(edge) = edge {
                if tx.send(edge).is_err() { return; }
            }
            if let Some(bodies) = frame {
                if tx.send(SensorEvent::Frame(bodies)).is_err() { return; }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimSensorSource: mouse simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Tracking id of the simulated operator.
pub const SIM_OPERATOR_ID: u64 = 7;
/// Tracking id of the simulated bystander.
pub const SIM_BYSTANDER_ID: u64 = 8;

/// Raw input from the simulator window.
#[derive(Clone, Debug, PartialEq)]
pub enum SimInput {
    /// Put one of the operator's hands at a display-space position.
    MoveHand { hand: Hand, x: f64, y: f64 },
    /// Show or hide a second person in frame.
    Bystander(bool),
    /// Simulate the sensor being unplugged or plugged back in.
    Availability(bool),
    /// One render frame elapsed; emit a body frame.
    Tick,
    Quit,
}

/// Sensor source driven by [`SimInput`] from the visualizer.
///
/// Hand positions are already in display coordinates, so pair it with
/// `ScreenProjector::identity()`.
pub struct SimSensorSource {
    pub rx: Receiver<SimInput>,
}

/// The simulated scene between ticks.
#[derive(Clone, Debug, PartialEq)]
pub struct SimScene {
    pub left:      Point3,
    pub right:     Point3,
    pub bystander: bool,
    pub available: bool,
}

impl Default for SimScene {
    fn default() -> Self {
        SimScene {
            left:      Point3::new(200.0, 300.0, 0.0),
            right:     Point3::new(560.0, 300.0, 0.0),
            bystander: false,
            available: true,
        }
    }
}

impl SimScene {
    /// Apply one input; returns the event to forward, if any.
    pub fn apply(&mut self, input: SimInput) -> Option<SensorEvent> {
        match input {
            SimInput::MoveHand { hand: Hand::Left, x, y }  => { self.left  = Point3::new(x, y, 0.0); None }
            SimInput::MoveHand { hand: Hand::Right, x, y } => { self.right = Point3::new(x, y, 0.0); None }
            SimInput::Bystander(on) => { self.bystander = on; None }
            SimInput::Availability(on) => {
                if on == self.available { return None; }
                self.available = on;
                Some(SensorEvent::Availability(on))
            }
            SimInput::Tick if self.available => Some(SensorEvent::Frame(self.bodies())),
            SimInput::Tick => None,
            SimInput::Quit => Some(SensorEvent::Quit),
        }
    }

    pub fn bodies(&self) -> Vec<TrackedBody> {
        let operator = TrackedBody::new(SIM_OPERATOR_ID)
            .with_joint(JointName::HandLeft,  self.left)
            .with_joint(JointName::HandRight, self.right);
        let mut bodies = vec![operator];
        if self.bystander {
            bodies.push(
                TrackedBody::new(SIM_BYSTANDER_ID)
                    .with_joint(JointName::HandLeft,  Point3::new(40.0, 80.0, 0.0))
                    .with_joint(JointName::HandRight, Point3::new(80.0, 80.0, 0.0)),
            );
        }
        bodies
    }
}

impl SensorSource for SimSensorSource {
    fn run(self: Box<Self>, tx: Sender<SensorEvent>) {
        let mut scene = SimScene::default();
        let _ = tx.send(SensorEvent::Availability(true));
        for input in self.rx {
            let quit = input == SimInput::Quit;
            if let Some(event) = scene.apply(input) {
                if tx.send(event).is_err() { return; }
            }
            if quit { return; }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
