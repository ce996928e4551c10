//! Turn-by-turn instruction generation.
//!
//! Classifies bearing changes along the route polyline at the 20°/45°/135°
//! thresholds, inserts a floor-change entry whenever consecutive points sit
//! on different floors, and brackets the sequence with start and destination
//! entries.  Each instruction carries the distance to the next one.

use inav_core::Coord;

const SLIGHT_DEG: f64 = 20.0;
const TURN_DEG: f64 = 45.0;
const SHARP_DEG: f64 = 135.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum InstructionKind {
    Start,
    Straight,
    SlightLeft,
    SlightRight,
    Left,
    Right,
    SharpLeft,
    SharpRight,
    FloorChange,
    Destination,
}

impl InstructionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InstructionKind::Start => "start",
            InstructionKind::Straight => "straight",
            InstructionKind::SlightLeft => "slight-left",
            InstructionKind::SlightRight => "slight-right",
            InstructionKind::Left => "left",
            InstructionKind::Right => "right",
            InstructionKind::SharpLeft => "sharp-left",
            InstructionKind::SharpRight => "sharp-right",
            InstructionKind::FloorChange => "floor-change",
            InstructionKind::Destination => "destination",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            InstructionKind::Start => "marker-start",
            InstructionKind::Straight => "arrow-up",
            InstructionKind::SlightLeft => "arrow-up-left",
            InstructionKind::SlightRight => "arrow-up-right",
            InstructionKind::Left => "arrow-left",
            InstructionKind::Right => "arrow-right",
            InstructionKind::SharpLeft => "arrow-down-left",
            InstructionKind::SharpRight => "arrow-down-right",
            InstructionKind::FloorChange => "stairs",
            InstructionKind::Destination => "marker-end",
        }
    }
}

// Serialize only: `icon` is a static string chosen from the kind, which
// cannot round-trip through Deserialize.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Instruction {
    pub kind: InstructionKind,
    pub text: String,
    /// Metres from this instruction point to the next instruction point.
    pub distance_m: f64,
    pub icon: &'static str,
}

impl Instruction {
    fn new(kind: InstructionKind, text: String) -> Self {
        Self { kind, text, distance_m: 0.0, icon: kind.icon() }
    }
}

/// Signed turn angle at vertex `i`, degrees in `(-180, 180]`; positive is a
/// right turn.
fn turn_at(path: &[Coord], i: usize) -> f64 {
    let inbound = path[i - 1].bearing_deg(path[i]);
    let outbound = path[i].bearing_deg(path[i + 1]);
    let mut delta = outbound - inbound;
    if delta > 180.0 {
        delta -= 360.0;
    } else if delta <= -180.0 {
        delta += 360.0;
    }
    delta
}

fn classify_turn(delta: f64) -> Option<InstructionKind> {
    let magnitude = delta.abs();
    if magnitude < SLIGHT_DEG {
        return None;
    }
    let right = delta > 0.0;
    Some(if magnitude < TURN_DEG {
        if right { InstructionKind::SlightRight } else { InstructionKind::SlightLeft }
    } else if magnitude <= SHARP_DEG {
        if right { InstructionKind::Right } else { InstructionKind::Left }
    } else {
        if right { InstructionKind::SharpRight } else { InstructionKind::SharpLeft }
    })
}

fn compass_8(bearing: f64) -> &'static str {
    const DIRS: [&str; 8] = [
        "north", "northeast", "east", "southeast", "south", "southwest", "west", "northwest",
    ];
    DIRS[(((bearing + 22.5) / 45.0).floor() as usize) % 8]
}

fn turn_text(kind: InstructionKind) -> &'static str {
    match kind {
        InstructionKind::SlightLeft => "Bear slightly left",
        InstructionKind::SlightRight => "Bear slightly right",
        InstructionKind::Left => "Turn left",
        InstructionKind::Right => "Turn right",
        InstructionKind::SharpLeft => "Make a sharp left",
        InstructionKind::SharpRight => "Make a sharp right",
        _ => "Continue straight",
    }
}

/// Generate instructions from a route polyline and its per-point floors.
/// `floors` must match `path` in length (the route invariant); shorter
/// inputs yield an empty list.
pub fn generate(path: &[Coord], floors: &[String]) -> Vec<Instruction> {
    if path.len() < 2 || path.len() != floors.len() {
        return Vec::new();
    }

    let mut out = vec![Instruction::new(
        InstructionKind::Start,
        format!("Head {}", compass_8(path[0].bearing_deg(path[1]))),
    )];
    let mut acc = 0.0;

    for i in 1..path.len() {
        // Floor transition between i-1 and i: the accumulated distance
        // belongs to the leg before the connector.
        if floors[i] != floors[i - 1] {
            out.last_mut().unwrap().distance_m = acc;
            acc = 0.0;
            out.push(Instruction::new(
                InstructionKind::FloorChange,
                format!("Change to floor {}", floors[i]),
            ));
            continue;
        }

        acc += path[i - 1].distance_m(path[i]);

        if i + 1 < path.len() && floors[i] == floors[i + 1] {
            if let Some(kind) = classify_turn(turn_at(path, i)) {
                out.last_mut().unwrap().distance_m = acc;
                acc = 0.0;
                out.push(Instruction::new(kind, turn_text(kind).to_string()));
            }
        }
    }

    out.last_mut().unwrap().distance_m = acc;
    out.push(Instruction::new(
        InstructionKind::Destination,
        "You have arrived".to_string(),
    ));
    out
}
