use serde::{Deserialize, Serialize};

use crate::task::Direction;

/// Screen-space point in physical pixels, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`
    pub fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned rectangle. Edges are inclusive for hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn centered(center: Point, width: f64, height: f64) -> Self {
        Self {
            x: center.x - width / 2.0,
            y: center.y - height / 2.0,
            width,
            height,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Center of a target `distance` pixels to the left or right of `screen_center`.
/// The vertical coordinate never changes.
pub fn target_center(screen_center: Point, distance: f64, direction: Direction) -> Point {
    let x = match direction {
        Direction::Left => screen_center.x - distance,
        Direction::Right => screen_center.x + distance,
    };
    Point::new(x, screen_center.y)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickOutcome {
    Hit { distance: f64 },
    Miss { distance: f64 },
}

impl ClickOutcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, ClickOutcome::Hit { .. })
    }

    pub fn distance(&self) -> f64 {
        match *self {
            ClickOutcome::Hit { distance } | ClickOutcome::Miss { distance } => distance,
        }
    }
}

/// Classifies a press against a circular target. A press exactly on the rim is a hit.
pub fn classify_click(press: Point, target: Point, radius: f64) -> ClickOutcome {
    let distance = press.distance_to(target);
    if distance <= radius {
        ClickOutcome::Hit { distance }
    } else {
        ClickOutcome::Miss { distance }
    }
}
