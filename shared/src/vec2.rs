/// 2D vector utilities for the square playing field.
/// Field coordinates are integers in spirit (the field is 128000 units wide) but are
/// carried as f64 so sub-unit motion accumulates between ticks.

#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize, ts_rs::TS, PartialEq)]
#[ts(export, export_to = "../bindings/")]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Shorthand constructor
pub fn vec2(x: f64, y: f64) -> Vec2 {
    Vec2::new(x, y)
}

/// Add two vectors
pub fn add(a: Vec2, b: Vec2) -> Vec2 {
    Vec2::new(a.x + b.x, a.y + b.y)
}

/// Subtract vectors (a - b)
pub fn sub(a: Vec2, b: Vec2) -> Vec2 {
    Vec2::new(a.x - b.x, a.y - b.y)
}

/// Scale vector by scalar
pub fn scale(v: Vec2, s: f64) -> Vec2 {
    Vec2::new(v.x * s, v.y * s)
}

/// Dot product
pub fn dot(a: Vec2, b: Vec2) -> f64 {
    a.x * b.x + a.y * b.y
}

/// Vector length
pub fn length(v: Vec2) -> f64 {
    v.x.hypot(v.y)
}

/// Normalize vector to unit length. The zero vector stays zero.
pub fn normalize(v: Vec2) -> Vec2 {
    let len = length(v);
    if len == 0.0 {
        return Vec2::ZERO;
    }
    scale(v, 1.0 / len)
}

/// Rotation by an exact multiple of 90 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuarterTurn {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl QuarterTurn {
    /// Build from any multiple of 90 degrees, negative values included.
    pub fn from_degrees(degrees: i32) -> Self {
        match (degrees / 90).rem_euclid(4) {
            0 => QuarterTurn::Deg0,
            1 => QuarterTurn::Deg90,
            2 => QuarterTurn::Deg180,
            _ => QuarterTurn::Deg270,
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            QuarterTurn::Deg0 => 0,
            QuarterTurn::Deg90 => 90,
            QuarterTurn::Deg180 => 180,
            QuarterTurn::Deg270 => 270,
        }
    }

    /// The turn that undoes this one (360 - angle).
    pub fn inverse(self) -> Self {
        QuarterTurn::from_degrees(360 - self.degrees())
    }
}

/// Rotate a vector clockwise by a quarter-turn multiple.
/// 270 is composed as 90 followed by 180 so every turn shares the same primitives.
pub fn rotate(v: Vec2, turn: QuarterTurn) -> Vec2 {
    match turn {
        QuarterTurn::Deg0 => v,
        QuarterTurn::Deg90 => Vec2::new(v.y, -v.x),
        QuarterTurn::Deg180 => scale(v, -1.0),
        QuarterTurn::Deg270 => rotate(rotate(v, QuarterTurn::Deg90), QuarterTurn::Deg180),
    }
}
