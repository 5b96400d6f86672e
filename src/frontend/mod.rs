//! Live rendering of the incoming point stream
//!
//! The actual plotting backend is an external collaborator. It is reached
//! through the [`PlotRenderer`] trait, which receives a snapshot of all points
//! received so far together with the configured [`PlotStyle`].
//!
//! # Main Types
//!
//! - [`PlotRenderer`] - Seam for plotting backends
//! - [`PlotStyle`] - Marker color, size and title handed to the renderer
//! - [`TracingRenderer`] - Headless renderer that logs progress and bounds
//! - [`LiveView`] - Poll loop driving a renderer until the stream ends

pub mod live_view;

pub use live_view::{LiveView, LiveViewOutcome};

use crate::config::ViewConfig;
use crate::types::{Bounds, Point};

/// Styling parameters passed along with every frame
#[derive(Debug, Clone, PartialEq)]
pub struct PlotStyle {
    /// RGBA marker color
    pub color: [u8; 4],
    pub marker_radius: f32,
    pub title: String,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self::from(&ViewConfig::default())
    }
}

impl From<&ViewConfig> for PlotStyle {
    fn from(view: &ViewConfig) -> Self {
        Self {
            color: view.color,
            marker_radius: view.marker_radius,
            title: view.title.clone(),
        }
    }
}

impl PlotStyle {
    /// Color as `#rrggbb`
    pub fn hex_color(&self) -> String {
        format!(
            "#{:02x}{:02x}{:02x}",
            self.color[0], self.color[1], self.color[2]
        )
    }
}

/// A plotting backend.
///
/// `render` is called whenever new points arrived; `finish` once with the
/// complete sequence after the stream closed.
pub trait PlotRenderer {
    fn render(&mut self, points: &[Point], style: &PlotStyle);

    fn finish(&mut self, points: &[Point], style: &PlotStyle) {
        self.render(points, style);
    }
}

/// Renderer without a display: reports each frame through `tracing`
#[derive(Debug, Default)]
pub struct TracingRenderer {
    frames: u64,
}

impl TracingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl PlotRenderer for TracingRenderer {
    fn render(&mut self, points: &[Point], style: &PlotStyle) {
        self.frames += 1;
        let Some(latest) = points.last() else {
            tracing::debug!("{}: waiting for points", style.title);
            return;
        };
        tracing::debug!(
            "{}: {} points, latest {}",
            style.title,
            points.len(),
            latest
        );
    }

    fn finish(&mut self, points: &[Point], style: &PlotStyle) {
        self.frames += 1;
        match Bounds::of(points) {
            Some(b) => tracing::info!(
                "{}: {} points, x in [{}, {}], y in [{}, {}]",
                style.title,
                points.len(),
                b.min.x,
                b.max.x,
                b.min.y,
                b.max.y
            ),
            None => tracing::info!("{}: no points received", style.title),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_from_view_config() {
        let view = ViewConfig {
            color: [255, 0, 16, 255],
            marker_radius: 3.5,
            title: "Ball".to_string(),
            ..Default::default()
        };
        let style = PlotStyle::from(&view);
        assert_eq!(style.hex_color(), "#ff0010");
        assert_eq!(style.marker_radius, 3.5);
        assert_eq!(style.title, "Ball");
    }

    #[test]
    fn test_tracing_renderer_counts_frames() {
        let mut renderer = TracingRenderer::new();
        let style = PlotStyle::default();
        renderer.render(&[], &style);
        renderer.render(&[Point::new(1.0, 2.0)], &style);
        renderer.finish(&[Point::new(1.0, 2.0)], &style);
        assert_eq!(renderer.frames(), 3);
    }
}
