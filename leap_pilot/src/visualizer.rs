//! Software-rendered visualizer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┬──────────────┐
//! │  prompt: "Learn Left Hand Top"                      │  SETPOINT    │
//! │                                                     │  thrust ███  │
//! │     ◇LT                          ◇RT                │  yaw    ─█─  │
//! │  ◇LL ◇LM ◇LR    ■ left      ◇RL ◇RM ◇RR   ■ right   │  pitch  ─█─  │
//! │     ◇LB                          ◇RB                │  roll   ─█─  │
//! │                                                     │  flags, link │
//! │  status bar                                         │  sensor      │
//! └─────────────────────────────────────────────────────┴──────────────┘
//! ```
//!
//! In simulation mode the mouse places the operator's hands: hold the left
//! button to move the left hand, the right button to move the right hand.

use std::sync::mpsc::Sender;
use std::time::Duration;

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use pilot_core::{ControlSample, Hand, MappingConfig, Point2, ReferencePoint};

use crate::app::Command;
use crate::sensor::SimInput;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:       usize = 1040;
pub const WIN_H:       usize = 600;
const PANEL_W:         usize = 280;
pub const CAM_W:       usize = WIN_W - PANEL_W;
const STATUS_Y:        usize = WIN_H - 36;
pub const CAM_H:       usize = STATUS_Y;
const BAR_W:           usize = PANEL_W - 40;
const BAR_H:           usize = 14;
const BG_COLOR:        u32   = 0xFF1A1A2E;
const PANEL_BG:        u32   = 0xFF16213E;
const TEXT_BG:         u32   = 0xFF0F3460;
const LEFT_COLOR:      u32   = 0xFF4FC3F7;
const RIGHT_COLOR:     u32   = 0xFFFFB74D;
const OTHER_COLOR:     u32   = 0xFF666666;
const TARGET_COLOR:    u32   = 0xFFFFFF00;
const ON_COLOR:        u32   = 0xFF66BB6A;
const OFF_COLOR:       u32   = 0xFF888888;
const ALERT_COLOR:     u32   = 0xFFEF5350;

// ════════════════════════════════════════════════════════════════════════════
// View: everything one frame needs, assembled by AppState
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct HandMarker {
    pub at:       Point2,
    pub hand:     Hand,
    /// Belongs to the locked operator (or the lone body while searching).
    pub operator: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct View {
    pub prompt:           String,
    pub learning:         Option<ReferencePoint>,
    pub references:       Vec<(ReferencePoint, Point2)>,
    pub hands:            Vec<HandMarker>,
    pub sample:           ControlSample,
    pub limits:           MappingConfig,
    pub operator:         Option<u64>,
    pub can_advance:      bool,
    pub fault:            Option<String>,
    pub link_running:     bool,
    pub link_connected:   bool,
    pub sensor_available: bool,
    pub status:           String,
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:    Window,
    buf:       Vec<u32>,
    /// Present only when the simulated sensor is in use.
    sim_tx:    Option<Sender<SimInput>>,
    bystander: bool,
    available: bool,
}

impl Visualizer {
    pub fn new(sim_tx: Option<Sender<SimInput>>) -> Result<Self, String> {
        let mut window = Window::new(
            "Leap Pilot - hand-tracking flight control",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| e.to_string())?;

        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim_tx,
            bystander: false,
            available: true,
        })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll mouse and keyboard.  Operator commands are returned; simulator
    /// input goes straight to the sim sensor thread.
    pub fn poll_input(&mut self) -> Vec<Command> {
        let mut commands = Vec::new();
        if !self.window.is_open() {
            commands.push(Command::Quit);
            return commands;
        }

        let pressed = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);

        if pressed(Key::Q)    { commands.push(Command::Quit); }
        if pressed(Key::N)    { commands.push(Command::Advance); }
        if pressed(Key::C)    { commands.push(Command::Cancel); }
        if pressed(Key::L)    { commands.push(Command::ToggleLink); }
        if pressed(Key::E)    { commands.push(Command::ToggleEstop); }
        if pressed(Key::Key1) { commands.push(Command::ToggleAux1); }
        if pressed(Key::Key2) { commands.push(Command::ToggleAux2); }

        let toggle_bystander    = pressed(Key::B);
        let toggle_availability = pressed(Key::U);

        if let Some(tx) = &self.sim_tx {
            if toggle_bystander {
                self.bystander = !self.bystander;
                let _ = tx.send(SimInput::Bystander(self.bystander));
            }
            if toggle_availability {
                self.available = !self.available;
                let _ = tx.send(SimInput::Availability(self.available));
            }
            if let Some((mx, my)) = self.window.get_mouse_pos(MouseMode::Discard) {
                let (x, y) = (mx as f64, (my as f64).min(CAM_H as f64));
                if (mx as usize) < CAM_W {
                    if self.window.get_mouse_down(MouseButton::Left) {
                        let _ = tx.send(SimInput::MoveHand { hand: Hand::Left, x, y });
                    }
                    if self.window.get_mouse_down(MouseButton::Right) {
                        let _ = tx.send(SimInput::MoveHand { hand: Hand::Right, x, y });
                    }
                }
            }
            let _ = tx.send(SimInput::Tick);
        }

        commands
    }

    /// Render one frame.
    pub fn render(&mut self, view: &View) {
        self.buf.fill(BG_COLOR);

        // ── Camera view ───────────────────────────────────────────────────
        for &(point, at) in &view.references {
            let color = hand_color(point.hand());
            let color = if view.learning == Some(point) { color } else { blend(color, BG_COLOR, 0.4) };
            if let Some((x, y)) = to_pixel(at) {
                self.draw_diamond(x, y, 6, color);
                self.draw_label(short_tag(point), x + 9, y.saturating_sub(2), color);
            }
        }
        if let Some(target) = view.learning {
            if let Some((x, y)) = view.references.iter()
                .find(|(p, _)| *p == target)
                .and_then(|&(_, at)| to_pixel(at))
            {
                self.draw_diamond(x, y, 10, TARGET_COLOR);
            }
        }
        for marker in &view.hands {
            let Some((x, y)) = to_pixel(marker.at) else { continue };
            let color = if marker.operator { hand_color(marker.hand) } else { OTHER_COLOR };
            self.fill_rect(x.saturating_sub(6), y.saturating_sub(6), 13, 13, color);
            self.draw_border(x.saturating_sub(7), y.saturating_sub(7), 15, 15, 0xFF000000);
        }

        let prompt_color = if view.can_advance { 0xFFEEEEEE } else { OFF_COLOR };
        self.draw_text(&view.prompt, 12, 12, prompt_color, 3);
        if let Some(fault) = &view.fault {
            self.draw_text("RECALIBRATE - PRESS C", 12, 36, ALERT_COLOR, 2);
            self.draw_label(fault, 12, 54, ALERT_COLOR);
        }

        // ── Setpoint panel ────────────────────────────────────────────────
        self.draw_panel(view);

        // ── Status bar ────────────────────────────────────────────────────
        self.fill_rect(0, STATUS_Y, CAM_W, WIN_H - STATUS_Y, TEXT_BG);
        self.draw_label(&view.status, 10, STATUS_Y + 10, 0xFFEEEEEE);

        // ── Key legend ────────────────────────────────────────────────────
        let legend = if self.sim_tx.is_some() {
            "N=next  C=cancel  L=link  E=estop  1/2=aux  mouse L/R=hands  B=bystander  U=sensor  Q=quit"
        } else {
            "N=next  C=cancel  L=link  E=estop  1/2=aux  Q=quit"
        };
        self.draw_label(legend, 10, WIN_H - 12, OFF_COLOR);

        if let Err(e) = self.window.update_with_buffer(&self.buf, WIN_W, WIN_H) {
            tracing::debug!("window update failed: {e}");
        }
    }

    // ── Panel ─────────────────────────────────────────────────────────────

    fn draw_panel(&mut self, view: &View) {
        let x = CAM_W + 20;
        self.fill_rect(CAM_W, 0, PANEL_W, WIN_H, PANEL_BG);
        self.draw_text("SETPOINT", x, 12, 0xFFFFD700, 2);

        let s = &view.sample;
        let l = &view.limits;
        let mut y = 44;
        for (name, value, low, high) in [
            ("THRUST", s.thrust, 0.0,             l.thrust_full),
            ("YAW",    s.yaw,    -l.yaw_limit,    l.yaw_limit),
            ("PITCH",  s.pitch,  -l.pitch_limit,  l.pitch_limit),
            ("ROLL",   s.roll,   -l.roll_limit,   l.roll_limit),
        ] {
            self.draw_label(&format!("{name} {value:.1}"), x, y, 0xFFEEEEEE);
            self.draw_bar(x, y + 10, value, low, high);
            y += 40;
        }

        y += 8;
        for (name, on) in [("ESTOP", s.estop), ("AUX1", s.aux1), ("AUX2", s.aux2)] {
            let color = match (name, on) {
                ("ESTOP", true) => ALERT_COLOR,
                (_, true)       => ON_COLOR,
                _               => OFF_COLOR,
            };
            self.draw_label(&format!("{name} {}", if on { "ON" } else { "OFF" }), x, y, color);
            y += 14;
        }

        y += 14;
        let (link, color) = match (view.link_running, view.link_connected) {
            (true, true)   => ("LINK STREAMING", ON_COLOR),
            (true, false)  => ("LINK NOT CONNECTED", ALERT_COLOR),
            (false, _)     => ("LINK STOPPED", OFF_COLOR),
        };
        self.draw_label(link, x, y, color);
        y += 14;
        let (sensor, color) = if view.sensor_available {
            ("SENSOR AVAILABLE", ON_COLOR)
        } else {
            ("SENSOR UNAVAILABLE", ALERT_COLOR)
        };
        self.draw_label(sensor, x, y, color);
        y += 14;
        let operator = match view.operator {
            Some(id) => format!("OPERATOR #{id}"),
            None     => "OPERATOR -".to_string(),
        };
        self.draw_label(&operator, x, y, 0xFFEEEEEE);
    }

    /// Horizontal bar; zero-centred when `low` is negative.
    fn draw_bar(&mut self, x: usize, y: usize, value: f64, low: f64, high: f64) {
        self.fill_rect(x, y, BAR_W, BAR_H, TEXT_BG);
        let span = high - low;
        if span > 0.0 {
            let frac = |v: f64| ((v - low) / span).clamp(0.0, 1.0);
            let zero = (frac(0.0) * BAR_W as f64) as usize;
            let at   = (frac(value) * BAR_W as f64) as usize;
            let (from, to) = if at < zero { (at, zero) } else { (zero, at) };
            let color = if value < low || value > high { ALERT_COLOR } else { ON_COLOR };
            self.fill_rect(x + from, y, to - from, BAR_H, color);
            self.fill_rect(x + zero, y, 1, BAR_H, 0xFFEEEEEE);
        }
        self.draw_border(x, y, BAR_W, BAR_H, 0xFF000000);
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y+h).min(WIN_H) {
            for col in x..(x+w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        for col in x..(x+w).min(WIN_W) {
            self.set_pixel(col, y, color);
            self.set_pixel(col, y+h-1, color);
        }
        for row in y..(y+h).min(WIN_H) {
            self.set_pixel(x, row, color);
            self.set_pixel(x+w-1, row, color);
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    fn draw_diamond(&mut self, cx: usize, cy: usize, r: usize, color: u32) {
        for dy in 0..=r as isize {
            let dx = r as isize - dy;
            for &(sx, sy) in &[
                (cx as isize + dx, cy as isize + dy),
                (cx as isize - dx, cy as isize + dy),
                (cx as isize + dx, cy as isize - dy),
                (cx as isize - dx, cy as isize - dy),
            ] {
                if sx >= 0 && sy >= 0 {
                    self.set_pixel(sx as usize, sy as usize, color);
                }
            }
        }
    }

    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32) {
        self.draw_text(text, x, y, color, 1);
    }

    /// Minimal bitmap font, 3×5 glyphs blown up by `scale`.
    fn draw_text(&mut self, text: &str, x: usize, y: usize, color: u32, scale: usize) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx + 4 * scale > WIN_W { break; }
        }
    }
}

fn hand_color(hand: Hand) -> u32 {
    match hand {
        Hand::Left  => LEFT_COLOR,
        Hand::Right => RIGHT_COLOR,
    }
}

/// Camera-view pixel for a display point, if it lands inside the view.
fn to_pixel(p: Point2) -> Option<(usize, usize)> {
    if !(p.x.is_finite() && p.y.is_finite()) || p.x < 0.0 || p.y < 0.0 {
        return None;
    }
    let (x, y) = (p.x as usize, p.y as usize);
    (x < CAM_W && y < CAM_H).then_some((x, y))
}

fn short_tag(p: ReferencePoint) -> &'static str {
    match p {
        ReferencePoint::LeftMiddle  => "LM",
        ReferencePoint::LeftTop     => "LT",
        ReferencePoint::LeftBottom  => "LB",
        ReferencePoint::LeftLeft    => "LL",
        ReferencePoint::LeftRight   => "LR",
        ReferencePoint::RightMiddle => "RM",
        ReferencePoint::RightTop    => "RT",
        ReferencePoint::RightBottom => "RB",
        ReferencePoint::RightLeft   => "RL",
        ReferencePoint::RightRight  => "RR",
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '>' => [0b100, 0b010, 0b001, 0b010, 0b100],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '#' => [0b101, 0b111, 0b101, 0b111, 0b101],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0-t) + cb as f32 * t) as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar,br) << 16) | (lerp(ag,bg) << 8) | lerp(ab,bb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 0.0), 0xFF000000);
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 1.0), 0xFFFFFFFF);
    }

    #[test]
    fn to_pixel_clips_to_camera_view() {
        assert_eq!(to_pixel(Point2::new(10.0, 20.0)), Some((10, 20)));
        assert_eq!(to_pixel(Point2::new(-1.0, 20.0)), None);
        assert_eq!(to_pixel(Point2::new(CAM_W as f64, 20.0)), None);
        assert_eq!(to_pixel(Point2::new(10.0, f64::NAN)), None);
    }

    #[test]
    fn every_reference_has_a_distinct_tag() {
        let tags: std::collections::HashSet<_> = ReferencePoint::ALL.iter().map(|&p| short_tag(p)).collect();
        assert_eq!(tags.len(), ReferencePoint::ALL.len());
    }
}
