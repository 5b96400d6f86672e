//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use displacement_stream::frontend::{PlotRenderer, PlotStyle};
use displacement_stream::Point;
use std::time::Duration;

/// Upper bound for waits that should finish almost immediately
pub fn test_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Renderer that remembers the size of every frame
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub frames: Vec<usize>,
    pub finished: Option<Vec<Point>>,
}

impl PlotRenderer for RecordingRenderer {
    fn render(&mut self, points: &[Point], _style: &PlotStyle) {
        self.frames.push(points.len());
    }

    fn finish(&mut self, points: &[Point], _style: &PlotStyle) {
        self.finished = Some(points.to_vec());
    }
}
