//! Final processing of a finished point stream
//!
//! This module provides:
//! - Dropout repair and spline resampling ([`Interpolator`])
//! - The two-column result file ([`write_result`] / [`read_result`])
//! - [`ResultProcessor`], which ties both together once the stream is closed

pub mod export;
pub mod interpolate;

pub use export::{read_result, write_result, ExportRecord};
pub use interpolate::{repair_dropouts, resample, Interpolator};

use crate::backend::SharedCollection;
use crate::config::AppConfig;
use crate::error::Result;
use crate::types::Point;
use std::path::PathBuf;

/// Summary of a processed and exported result
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedResult {
    /// Points taken from the collection
    pub input_points: usize,
    /// Rows written to the output file
    pub exported_rows: usize,
    pub output: PathBuf,
}

/// Interpolates the final point sequence and writes the result file
#[derive(Debug, Clone)]
pub struct ResultProcessor {
    interpolate: bool,
    interpolator: Interpolator,
    output: PathBuf,
}

impl ResultProcessor {
    pub fn new(interpolate: bool, interpolator: Interpolator, output: impl Into<PathBuf>) -> Self {
        Self {
            interpolate,
            interpolator,
            output: output.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.worker.interpolate,
            Interpolator::new(config.interpolation.clone()),
            config.worker.output.clone(),
        )
    }

    /// Apply interpolation if enabled
    pub fn process(&self, points: &[Point]) -> Vec<Point> {
        if self.interpolate {
            let processed = self.interpolator.process(points);
            tracing::debug!(
                "Interpolated {} points into {} samples",
                points.len(),
                processed.len()
            );
            processed
        } else {
            points.to_vec()
        }
    }

    /// Process the full contents of a closed collection and export them
    pub fn finalize(&self, collection: &SharedCollection) -> Result<ProcessedResult> {
        if !collection.is_closed() {
            tracing::warn!("Processing a point stream that is still open");
        }

        let points = collection.snapshot();
        if points.is_empty() {
            tracing::warn!("No points received, writing an empty result");
        }

        let processed = self.process(&points);
        let exported_rows = write_result(&self.output, &processed)?;

        Ok(ProcessedResult {
            input_points: points.len(),
            exported_rows,
            output: self.output.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InterpolationConfig;

    fn closed(points: &[(f64, f64)]) -> SharedCollection {
        SharedCollection::from_points(points.iter().map(|&p| Point::from(p)).collect())
    }

    #[test]
    fn test_finalize_without_interpolation_exports_points_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("displacements.result");
        let processor = ResultProcessor::new(false, Interpolator::default(), &output);

        let result = processor
            .finalize(&closed(&[(0.0, 0.0), (1.0, 1.0), (2.0, 4.0)]))
            .unwrap();

        assert_eq!(result.input_points, 3);
        assert_eq!(result.exported_rows, 3);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "0 0\n1 1\n2 4\n");
    }

    #[test]
    fn test_finalize_with_interpolation() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("displacements.result");
        let interpolator = Interpolator::new(InterpolationConfig {
            repair_dropouts: true,
            samples_per_segment: 2,
        });
        let processor = ResultProcessor::new(true, interpolator, &output);

        let result = processor
            .finalize(&closed(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]))
            .unwrap();

        assert_eq!(result.exported_rows, 5);
        let rows = read_result(&output).unwrap();
        assert_eq!(rows.first(), Some(&Point::new(1.0, 1.0)));
        assert_eq!(rows.last(), Some(&Point::new(3.0, 3.0)));
    }

    #[test]
    fn test_finalize_empty_collection() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("empty.result");
        let processor = ResultProcessor::new(true, Interpolator::default(), &output);

        let result = processor.finalize(&closed(&[])).unwrap();
        assert_eq!(result.exported_rows, 0);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "");
    }
}
