//! Core data types for displacement-stream
//!
//! # Main Types
//!
//! - [`Point`] - A single (x, y) displacement sample reported by the worker
//! - [`Bounds`] - Axis-aligned bounding box of a set of points, used for
//!   plot scaling and run summaries

use serde::{Deserialize, Serialize};

/// One measured displacement sample.
///
/// Points are plain values and never change once they have been appended to a
/// [`SharedCollection`](crate::backend::SharedCollection).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The worker reports an exact zero displacement when it failed to match
    /// a frame pair.
    pub fn is_dropout(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Linear interpolation between `self` (t = 0) and `other` (t = 1)
    pub fn lerp(&self, other: &Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Parses a two-column row: `x y`, `x,y` or `x, y`.
///
/// Both values must be finite. This is the record format of the worker's
/// point stream and of the exported result file.
impl std::str::FromStr for Point {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = match line.split_once(',') {
            Some((_, right)) if right.contains(',') => {
                return Err("more than one comma".to_string());
            }
            Some((left, right)) => {
                if left.trim().is_empty() || right.trim().is_empty() {
                    return Err("comma without a value on both sides".to_string());
                }
                left.split_whitespace().chain(right.split_whitespace()).collect()
            }
            None => line.split_whitespace().collect(),
        };

        if fields.len() != 2 {
            return Err(format!("expected 2 fields, found {}", fields.len()));
        }

        let parse = |field: &str| -> Result<f64, String> {
            let value: f64 = field
                .parse()
                .map_err(|_| format!("'{}' is not a number", field))?;
            if value.is_finite() {
                Ok(value)
            } else {
                Err(format!("'{}' is not finite", field))
            }
        };

        Ok(Point::new(parse(fields[0])?, parse(fields[1])?))
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Bounding box of a point set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// Compute the bounds of `points`, or `None` if there are none
    pub fn of(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Bounds {
            min: *first,
            max: *first,
        };
        for p in &points[1..] {
            bounds.min.x = bounds.min.x.min(p.x);
            bounds.min.y = bounds.min.y.min(p.y);
            bounds.max.x = bounds.max.x.max(p.x);
            bounds.max.y = bounds.max.y.max(p.y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}
