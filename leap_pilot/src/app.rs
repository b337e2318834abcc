//! Top-level application state.
//!
//! `AppState` owns the [`PilotContext`] and a cached picture of the tracker
//! for the visualizer.  It turns operator [`Command`]s and [`SensorEvent`]s
//! into tracker calls, and re-reads the tracker only when its revision
//! counter moves.

use std::sync::mpsc::{self, Receiver, TryRecvError};

use pilot_core::{
    shared_sink, Hand, NullSink, PilotContext, Point2, Projector, ReferencePoint, Revision,
    ScreenProjector, SharedSink, TrackedBody, TrackingState,
};
use pilot_link::UdpSink;

use crate::config::{AppConfig, SensorMode};
use crate::error::AppError;
use crate::sensor::{spawn_sensor_source, SensorEvent, SimSensorSource};
use crate::visualizer::{HandMarker, View, Visualizer};

// ════════════════════════════════════════════════════════════════════════════
// Command
// ════════════════════════════════════════════════════════════════════════════

/// Operator input, independent of where it came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Next calibration step.
    Advance,
    /// Back to idle, forgetting the calibration.
    Cancel,
    ToggleLink,
    ToggleEstop,
    ToggleAux1,
    ToggleAux2,
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    ctx:       PilotContext,
    projector: ScreenProjector,

    // ── tracker picture, refreshed on revision change ────────────────────
    watch:      Revision,
    seen:       Option<u64>,
    prompt:     String,
    learning:   Option<ReferencePoint>,
    references: Vec<(ReferencePoint, Point2)>,
    fault:      Option<String>,

    // ── latest frame ─────────────────────────────────────────────────────
    hands:            Vec<HandMarker>,
    sensor_available: bool,

    quit:       bool,
    pub status: String,
}

impl AppState {
    pub fn new(ctx: PilotContext, projector: ScreenProjector) -> Self {
        let watch = ctx.tracker().watch();
        let mut app = AppState {
            ctx,
            projector,
            watch,
            seen:             None,
            prompt:           String::new(),
            learning:         None,
            references:       Vec::new(),
            fault:            None,
            hands:            Vec::new(),
            sensor_available: false,
            quit:             false,
            status:           "Ready - press N to search for an operator".to_string(),
        };
        app.refresh();
        app
    }

    /// Build the context described by `cfg`: UDP link unless `null_link`.
    pub fn from_config(cfg: &AppConfig) -> Self {
        let projector = match cfg.sensor {
            SensorMode::Sim  => ScreenProjector::identity(),
            SensorMode::Leap => cfg.leap_projection,
        };
        let sink: SharedSink = if cfg.null_link {
            shared_sink(NullSink::default())
        } else {
            shared_sink(UdpSink::new(cfg.link.clone()))
        };
        AppState::new(PilotContext::new(sink, projector, &cfg.pilot), projector)
    }

    // ── process one Command ──────────────────────────────────────────────

    pub fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Advance => match self.ctx.tracker_mut().advance() {
                Ok(state) => self.status = format!("Step: {}", state.label()),
                Err(e)    => self.status = format!("Cannot advance: {e}"),
            },

            Command::Cancel => {
                self.ctx.tracker_mut().cancel();
                self.status = "Calibration cancelled".to_string();
            }

            Command::ToggleLink => {
                let running = self.ctx.toggle_link();
                self.status = match (running, self.ctx.link_connected()) {
                    (true, true)  => "Link started".to_string(),
                    (true, false) => "Link started but not connected".to_string(),
                    (false, _)    => "Link stopped".to_string(),
                };
                tracing::info!(running, "link toggled");
            }

            Command::ToggleEstop => {
                let on = self.ctx.store().toggle_estop();
                tracing::info!(on, "estop toggled");
                self.status = format!("Emergency stop {}", if on { "ON" } else { "OFF" });
            }
            Command::ToggleAux1 => {
                let on = self.ctx.store().toggle_aux1();
                self.status = format!("Aux 1 {}", if on { "ON" } else { "OFF" });
            }
            Command::ToggleAux2 => {
                let on = self.ctx.store().toggle_aux2();
                self.status = format!("Aux 2 {}", if on { "ON" } else { "OFF" });
            }

            Command::Quit => self.quit = true,
        }
    }

    // ── process one SensorEvent ──────────────────────────────────────────

    pub fn handle_sensor(&mut self, event: SensorEvent) {
        match event {
            SensorEvent::Frame(bodies) => {
                self.ctx.tracker_mut().on_frame(&bodies);
                self.hands = self.markers(&bodies);
            }
            SensorEvent::Availability(available) => {
                if available == self.sensor_available { return; }
                self.sensor_available = available;
                self.ctx.tracker_mut().on_availability_changed(available);
                if !available {
                    self.hands.clear();
                }
                self.status = if available {
                    "Sensor available".to_string()
                } else {
                    "Sensor lost - calibration cancelled".to_string()
                };
            }
            SensorEvent::Quit => self.quit = true,
        }
    }

    /// Re-read the tracker if its revision moved.  Returns whether it did.
    pub fn refresh(&mut self) -> bool {
        let rev = self.watch.get();
        if self.seen == Some(rev) {
            return false;
        }
        self.seen = Some(rev);

        let tracker = self.ctx.tracker();
        let state = tracker.state();
        self.prompt = state.label();
        self.learning = match state {
            TrackingState::Learn(p) => Some(p),
            _                       => None,
        };
        self.references = tracker.references().recorded().collect();
        self.fault = tracker.fault().map(|e| e.to_string());
        true
    }

    pub fn view(&self) -> View {
        let tracker = self.ctx.tracker();
        View {
            prompt:           self.prompt.clone(),
            learning:         self.learning,
            references:       self.references.clone(),
            hands:            self.hands.clone(),
            sample:           self.ctx.store().snapshot(),
            limits:           tracker.config().clone(),
            operator:         tracker.operator(),
            can_advance:      tracker.can_advance(),
            fault:            self.fault.clone(),
            link_running:     self.ctx.link_running(),
            link_connected:   self.ctx.link_connected(),
            sensor_available: self.sensor_available,
            status:           self.status.clone(),
        }
    }

    pub fn should_quit(&self) -> bool { self.quit }

    pub fn shutdown(&mut self) { self.ctx.shutdown(); }

    /// Hands of every tracked body, flagging the operator's.  Before lock-on
    /// a lone body counts as the operator.
    fn markers(&self, bodies: &[TrackedBody]) -> Vec<HandMarker> {
        let tracked: Vec<&TrackedBody> = bodies.iter().filter(|b| b.is_tracked).collect();
        let operator = self.ctx.tracker().operator()
            .or_else(|| match tracked.as_slice() {
                [only] => Some(only.tracking_id),
                _      => None,
            });

        let mut markers = Vec::new();
        for body in tracked {
            for hand in [Hand::Left, Hand::Right] {
                if let Some(p) = body.hand(hand) {
                    markers.push(HandMarker {
                        at:       self.projector.project(p),
                        hand,
                        operator: Some(body.tracking_id) == operator,
                    });
                }
            }
        }
        markers
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// Creates the sensor source (simulation by default, LeapMotion with
/// `sensor = "leap"` and the `leap` feature), the visualizer and the pilot
/// context, then drives the event/render loop at ~60 fps.  The link is shut
/// down before returning.
pub fn run(cfg: AppConfig) -> Result<(), AppError> {
    // ── Sensor ────────────────────────────────────────────────────────────
    let (sim_tx, sensor_rx) = match cfg.sensor {
        SensorMode::Sim => {
            let (tx, rx) = mpsc::channel();
            (Some(tx), spawn_sensor_source(SimSensorSource { rx }))
        }
        SensorMode::Leap => (None, leap_source()?),
    };

    // ── Visualizer (owns the window and the sim input sender) ────────────
    let mut vis = Visualizer::new(sim_tx).map_err(AppError::Window)?;

    // ── App state ─────────────────────────────────────────────────────────
    let mut app = AppState::from_config(&cfg);
    if cfg.auto_link {
        app.handle_command(Command::ToggleLink);
    }
    tracing::info!(sensor = ?cfg.sensor, target = %cfg.link.target, null_link = cfg.null_link, "pilot running");

    // ── Main loop ─────────────────────────────────────────────────────────
    while vis.is_open() && !app.should_quit() {
        // 1. Window input
        for cmd in vis.poll_input() {
            app.handle_command(cmd);
        }

        // 2. Drain sensor events
        loop {
            match sensor_rx.try_recv() {
                Ok(event) => app.handle_sensor(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    app.handle_sensor(SensorEvent::Availability(false));
                    break;
                }
            }
        }

        // 3. Pick up tracker changes
        app.refresh();

        // 4. Render
        vis.render(&app.view());
    }

    app.shutdown();
    Ok(())
}

#[cfg(feature = "leap")]
fn leap_source() -> Result<Receiver<SensorEvent>, AppError> {
    Ok(spawn_sensor_source(crate::sensor::LeapSensorSource))
}

#[cfg(not(feature = "leap"))]
fn leap_source() -> Result<Receiver<SensorEvent>, AppError> {
    Err(AppError::LeapUnavailable)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use pilot_core::{Axes, JointName, PilotConfig, Point3, RecordingSink};

    const OP: u64 = 7;

    fn make_app() -> (AppState, RecordingSink) {
        let probe = RecordingSink::new();
        let ctx = PilotContext::new(shared_sink(probe.clone()), ScreenProjector::identity(), &PilotConfig::default());
        let mut app = AppState::new(ctx, ScreenProjector::identity());
        app.handle_sensor(SensorEvent::Availability(true));
        (app, probe)
    }

    fn body(id: u64, left: (f64, f64), right: (f64, f64)) -> TrackedBody {
        TrackedBody::new(id)
            .with_joint(JointName::HandLeft,  Point3::new(left.0, left.1, 0.0))
            .with_joint(JointName::HandRight, Point3::new(right.0, right.1, 0.0))
    }

    fn frame(left: (f64, f64), right: (f64, f64)) -> SensorEvent {
        SensorEvent::Frame(vec![body(OP, left, right)])
    }

    /// Walk the whole calibration with a cross-shaped pose per hand.
    fn calibrate(app: &mut AppState) {
        app.handle_command(Command::Advance);
        app.handle_sensor(frame((200.0, 300.0), (560.0, 300.0)));
        let poses = [
            ((200.0, 300.0), (560.0, 300.0)), // LeftMiddle
            ((200.0, 200.0), (560.0, 300.0)), // LeftTop
            ((200.0, 400.0), (560.0, 300.0)), // LeftBottom
            ((100.0, 300.0), (560.0, 300.0)), // LeftLeft
            ((300.0, 300.0), (560.0, 300.0)), // LeftRight
            ((200.0, 300.0), (560.0, 300.0)), // RightMiddle
            ((200.0, 300.0), (560.0, 200.0)), // RightTop
            ((200.0, 300.0), (560.0, 400.0)), // RightBottom
            ((200.0, 300.0), (460.0, 300.0)), // RightLeft
            ((200.0, 300.0), (660.0, 300.0)), // RightRight
        ];
        for (left, right) in poses {
            app.handle_command(Command::Advance);
            app.handle_sensor(frame(left, right));
        }
        app.handle_command(Command::Advance);
        app.refresh();
    }

    #[test]
    fn advance_from_idle_searches() {
        let (mut app, _) = make_app();
        app.handle_command(Command::Advance);
        assert!(app.refresh());
        assert_eq!(app.prompt, "Searching for Operator");
    }

    #[test]
    fn advance_refused_with_bystander_in_frame() {
        let (mut app, _) = make_app();
        app.handle_command(Command::Advance);
        app.handle_sensor(SensorEvent::Frame(vec![
            body(OP, (200.0, 300.0), (560.0, 300.0)),
            body(OP + 1, (40.0, 80.0), (80.0, 80.0)),
        ]));
        app.handle_command(Command::Advance);
        assert!(app.status.starts_with("Cannot advance"));
        assert_eq!(app.ctx.tracker().state(), TrackingState::Searching);
    }

    #[test]
    fn full_calibration_reaches_tracking_and_maps() {
        let (mut app, _) = make_app();
        calibrate(&mut app);
        assert_eq!(app.ctx.tracker().state(), TrackingState::Tracking);
        assert_eq!(app.references.len(), 10);
        assert_eq!(app.fault, None);

        app.handle_sensor(frame((150.0, 300.0), (560.0, 300.0)));
        let sample = app.ctx.store().snapshot();
        assert_eq!(sample.thrust, 50.0);
        assert_eq!(sample.yaw, -100.0);
        assert_eq!(sample.pitch, 0.0);
    }

    #[test]
    fn sensor_loss_cancels_calibration() {
        let (mut app, _) = make_app();
        calibrate(&mut app);
        app.handle_sensor(frame((150.0, 300.0), (560.0, 300.0)));
        app.handle_sensor(SensorEvent::Availability(false));
        app.refresh();
        assert_eq!(app.ctx.tracker().state(), TrackingState::Idle);
        assert!(app.references.is_empty());
        assert_eq!(app.ctx.store().snapshot().axes(), Axes::default());
        assert!(app.view().hands.is_empty());
    }

    #[test]
    fn cancel_returns_to_idle() {
        let (mut app, _) = make_app();
        calibrate(&mut app);
        app.handle_command(Command::Cancel);
        app.refresh();
        assert_eq!(app.prompt, TrackingState::Idle.label());
        assert_eq!(app.learning, None);
    }

    #[test]
    fn flag_commands_toggle_store() {
        let (mut app, _) = make_app();
        app.handle_command(Command::ToggleEstop);
        app.handle_command(Command::ToggleAux2);
        let s = app.ctx.store().snapshot();
        assert!(s.estop);
        assert!(!s.aux1);
        assert!(s.aux2);
        app.handle_command(Command::ToggleEstop);
        assert!(!app.ctx.store().snapshot().estop);
    }

    #[test]
    fn toggle_link_streams_to_sink() {
        let (mut app, probe) = make_app();
        app.handle_command(Command::ToggleLink);
        assert!(app.view().link_running);
        assert_eq!(app.status, "Link started");
        app.handle_command(Command::ToggleLink);
        assert!(!app.view().link_running);
        assert!(!probe.is_empty());
        assert_eq!(probe.sent()[0].axes(), Axes::default());
    }

    #[test]
    fn refresh_only_on_revision_change() {
        let (mut app, _) = make_app();
        assert!(!app.refresh());
        app.handle_command(Command::Advance);
        assert!(app.refresh());
        assert!(!app.refresh());
    }

    #[test]
    fn bystander_hands_are_not_operator() {
        let (mut app, _) = make_app();
        app.handle_command(Command::Advance);
        app.handle_sensor(SensorEvent::Frame(vec![
            body(OP, (200.0, 300.0), (560.0, 300.0)),
            body(OP + 1, (40.0, 80.0), (80.0, 80.0)),
        ]));
        let hands = app.view().hands;
        assert_eq!(hands.len(), 4);
        assert!(hands.iter().all(|h| !h.operator));

        app.handle_sensor(frame((200.0, 300.0), (560.0, 300.0)));
        let hands = app.view().hands;
        assert_eq!(hands.len(), 2);
        assert!(hands.iter().all(|h| h.operator));
    }

    #[test]
    fn quit_from_command_or_sensor() {
        let (mut app, _) = make_app();
        assert!(!app.should_quit());
        app.handle_command(Command::Quit);
        assert!(app.should_quit());

        let (mut app, _) = make_app();
        app.handle_sensor(SensorEvent::Quit);
        assert!(app.should_quit());
    }
}
