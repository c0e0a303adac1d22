//! Perception geometry: distances, bearings and line-of-sight tests.
//!
//! Pure functions over plain structs. The controller calls
//! [`has_line_of_sight`] at least once per tick, so everything here is
//! allocation-free.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// 2D point / vector in world units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle` (radians, 0 = +x).
    pub fn from_angle(angle: f32) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Normalized copy, or zero for a zero-length vector.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len <= f32::EPSILON {
            Self::ZERO
        } else {
            Self::new(self.x / len, self.y / len)
        }
    }

    /// Perpendicular vector rotated +90°.
    pub fn perp(self) -> Self {
        Self::new(-self.y, self.x)
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned wall rectangle. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub active: bool,
}

impl Wall {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            active: true,
        }
    }

    pub fn min_x(&self) -> f32 {
        self.x
    }
    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }
    pub fn min_y(&self) -> f32 {
        self.y
    }
    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }
}

/// A deployed smoke cloud. The radius is a global constant, see
/// [`crate::config::AiConfig::smoke_radius`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Smoke {
    pub position: Vec2,
    pub active: bool,
}

impl Smoke {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            active: true,
        }
    }
}

pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (b - a).length()
}

/// Bearing from `a` to `b` in radians (`atan2` convention).
pub fn angle_between(a: Vec2, b: Vec2) -> f32 {
    (b.y - a.y).atan2(b.x - a.x)
}

/// Slab (Liang–Barsky) clip of segment `from→to` against the wall's bounds.
pub fn segment_intersects_rect(from: Vec2, to: Vec2, wall: &Wall) -> bool {
    let d = to - from;
    let mut t0 = 0.0_f32;
    let mut t1 = 1.0_f32;

    let edges = [
        (-d.x, from.x - wall.min_x()),
        (d.x, wall.max_x() - from.x),
        (-d.y, from.y - wall.min_y()),
        (d.y, wall.max_y() - from.y),
    ];

    for (p, q) in edges {
        if p == 0.0 {
            // parallel to this slab
            if q < 0.0 {
                return false;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return false;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return false;
            }
            t1 = t1.min(r);
        }
    }
    t0 <= t1
}

/// True when the closest point of segment `from→to` lies within `radius`
/// of `center`.
pub fn segment_intersects_circle(from: Vec2, to: Vec2, center: Vec2, radius: f32) -> bool {
    let d = to - from;
    let len_sq = d.dot(d);
    let t = if len_sq <= f32::EPSILON {
        0.0
    } else {
        ((center - from).dot(d) / len_sq).clamp(0.0, 1.0)
    };
    let closest = from + d * t;
    distance(closest, center) <= radius
}

/// Line-of-sight between two points.
///
/// Out of range → false. Otherwise false if the segment touches any active
/// wall rectangle or any active smoke volume.
pub fn has_line_of_sight(
    from: Vec2,
    to: Vec2,
    walls: &[Wall],
    smokes: &[Smoke],
    max_range: f32,
    smoke_radius: f32,
) -> bool {
    if distance(from, to) > max_range {
        return false;
    }
    if walls
        .iter()
        .any(|w| w.active && segment_intersects_rect(from, to, w))
    {
        return false;
    }
    !smokes
        .iter()
        .any(|s| s.active && segment_intersects_circle(from, to, s.position, smoke_radius))
}
