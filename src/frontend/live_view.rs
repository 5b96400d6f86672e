//! Live view poll loop
//!
//! Re-renders the point collection at a fixed interval while the worker is
//! streaming. The wait between frames is a `select!` over the
//! `stream_closed` and `aborted` signals with the poll interval as timeout,
//! so the loop sleeps between frames and still reacts to the end of the
//! stream immediately.

use crate::backend::{LifecycleSynchronizer, SharedCollection};
use crate::config::ViewConfig;
use crate::frontend::{PlotRenderer, PlotStyle};
use crossbeam_channel::select;
use std::time::Duration;

/// Why the live view stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveViewOutcome {
    /// The stream ended; a final frame with all points was rendered
    StreamClosed { frames: u64, points: usize },
    /// The run was aborted before the stream ended
    Aborted { frames: u64, points: usize },
}

impl LiveViewOutcome {
    pub fn frames(&self) -> u64 {
        match self {
            LiveViewOutcome::StreamClosed { frames, .. } | LiveViewOutcome::Aborted { frames, .. } => {
                *frames
            }
        }
    }
}

/// Drives a [`PlotRenderer`] from a [`SharedCollection`]
#[derive(Debug, Clone)]
pub struct LiveView {
    interval: Duration,
    style: PlotStyle,
}

impl LiveView {
    pub fn new(interval: Duration, style: PlotStyle) -> Self {
        Self { interval, style }
    }

    pub fn from_config(view: &ViewConfig) -> Self {
        Self::new(view.poll_interval(), PlotStyle::from(view))
    }

    /// Render until `stream_closed` or `aborted` is signalled. Frames are
    /// only rendered when the number of points changed.
    pub fn run(
        &self,
        collection: &SharedCollection,
        sync: &LifecycleSynchronizer,
        renderer: &mut dyn PlotRenderer,
    ) -> LiveViewOutcome {
        let mut frames = 0u64;
        let mut rendered: Option<usize> = None;

        loop {
            if rendered != Some(collection.len()) {
                let points = collection.snapshot();
                renderer.render(&points, &self.style);
                frames += 1;
                rendered = Some(points.len());
            }

            select! {
                recv(sync.stream_closed().observer()) -> _ => {
                    let points = collection.snapshot();
                    renderer.finish(&points, &self.style);
                    frames += 1;
                    return LiveViewOutcome::StreamClosed {
                        frames,
                        points: points.len(),
                    };
                }
                recv(sync.aborted().observer()) -> _ => {
                    tracing::debug!("Live view stopped, run aborted");
                    return LiveViewOutcome::Aborted {
                        frames,
                        points: collection.len(),
                    };
                }
                default(self.interval) => {}
            }
        }
    }

    /// Render a finished collection once, e.g. a result file in plot-only mode
    pub fn show_final(&self, collection: &SharedCollection, renderer: &mut dyn PlotRenderer) {
        renderer.finish(&collection.snapshot(), &self.style);
    }
}
