//! Trajectory interpolation
//!
//! Post-processing of the final point sequence in two deterministic stages:
//!
//! 1. **Dropout repair** - the worker reports an exact `(0, 0)` when it
//!    could not match two frames. Those samples are replaced by linear
//!    interpolation (by sample index) between the nearest valid neighbours.
//!    Dropouts before the first or after the last valid sample copy that
//!    sample. A sequence without any valid sample is left as is.
//! 2. **Resampling** - a uniform Catmull-Rom spline through the repaired
//!    points, sampled `samples_per_segment` times per segment. The curve
//!    passes through every input point, so `n` inputs give
//!    `(n - 1) * samples_per_segment + 1` outputs.

use crate::config::InterpolationConfig;
use crate::types::Point;

/// Applies dropout repair and spline resampling
#[derive(Debug, Clone)]
pub struct Interpolator {
    config: InterpolationConfig,
}

impl Default for Interpolator {
    fn default() -> Self {
        Self::new(InterpolationConfig::default())
    }
}

impl Interpolator {
    pub fn new(config: InterpolationConfig) -> Self {
        Self { config }
    }

    /// Run both stages
    pub fn process(&self, points: &[Point]) -> Vec<Point> {
        if self.config.repair_dropouts {
            let repaired = repair_dropouts(points);
            resample(&repaired, self.config.samples_per_segment)
        } else {
            resample(points, self.config.samples_per_segment)
        }
    }
}

/// Replace `(0, 0)` dropouts, see the module docs
pub fn repair_dropouts(points: &[Point]) -> Vec<Point> {
    let valid: Vec<usize> = points
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.is_dropout())
        .map(|(i, _)| i)
        .collect();

    let (Some(&first), Some(&last)) = (valid.first(), valid.last()) else {
        return points.to_vec();
    };

    let mut out = points.to_vec();
    for slot in out.iter_mut().take(first) {
        *slot = points[first];
    }
    for slot in out.iter_mut().skip(last + 1) {
        *slot = points[last];
    }

    for pair in valid.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let gap = b - a;
        for i in a + 1..b {
            let t = (i - a) as f64 / gap as f64;
            out[i] = points[a].lerp(&points[b], t);
        }
    }

    out
}

/// Uniform Catmull-Rom resampling, see the module docs.
///
/// `samples_per_segment` of 0 is treated as 1.
pub fn resample(points: &[Point], samples_per_segment: usize) -> Vec<Point> {
    if points.len() < 2 {
        return points.to_vec();
    }
    let k = samples_per_segment.max(1);
    let last = points.len() - 1;

    let mut out = Vec::with_capacity(last * k + 1);
    for i in 0..last {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(last)];

        out.push(p1);
        for s in 1..k {
            let t = s as f64 / k as f64;
            out.push(catmull_rom(&p0, &p1, &p2, &p3, t));
        }
    }
    out.push(points[last]);
    out
}

fn catmull_rom(p0: &Point, p1: &Point, p2: &Point, p3: &Point, t: f64) -> Point {
    let t2 = t * t;
    let t3 = t2 * t;
    let axis = |a: f64, b: f64, c: f64, d: f64| {
        0.5 * (2.0 * b
            + (-a + c) * t
            + (2.0 * a - 5.0 * b + 4.0 * c - d) * t2
            + (-a + 3.0 * b - 3.0 * c + d) * t3)
    };
    Point::new(
        axis(p0.x, p1.x, p2.x, p3.x),
        axis(p0.y, p1.y, p2.y, p3.y),
    )
}
