//! Test data builders for creating test objects

use displacement_stream::config::{AppConfig, InterpolationConfig};
use std::path::{Path, PathBuf};

/// Builder for an [`AppConfig`] rooted in a temporary directory
pub struct ConfigBuilder {
    config: AppConfig,
}

impl ConfigBuilder {
    pub fn new(root: &Path) -> Self {
        let mut config = AppConfig::default();
        config.project.root = root.to_path_buf();
        config.worker.output = root.join("displacements.result");
        config.worker.interpolate = false;
        config.view.poll_interval_ms = 5;
        config.stream_close_timeout_ms = 2000;
        Self { config }
    }

    pub fn interpolate(mut self, samples_per_segment: usize) -> Self {
        self.config.worker.interpolate = true;
        self.config.interpolation = InterpolationConfig {
            repair_dropouts: true,
            samples_per_segment,
        };
        self
    }

    pub fn output(mut self, output: impl Into<PathBuf>) -> Self {
        self.config.worker.output = output.into();
        self
    }

    pub fn stream_close_timeout_ms(mut self, timeout: u64) -> Self {
        self.config.stream_close_timeout_ms = timeout;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

/// Encode points in the worker's line format
pub fn point_lines(points: &[(f64, f64)]) -> Vec<u8> {
    points
        .iter()
        .map(|(x, y)| format!("{} {}\n", x, y))
        .collect::<String>()
        .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new(Path::new("/tmp/run"))
            .interpolate(3)
            .build();

        assert_eq!(config.worker.output, PathBuf::from("/tmp/run/displacements.result"));
        assert!(config.worker.interpolate);
        assert_eq!(config.interpolation.samples_per_segment, 3);
    }

    #[test]
    fn test_point_lines() {
        assert_eq!(point_lines(&[(0.0, 0.0), (1.5, -2.0)]), b"0 0\n1.5 -2\n");
    }
}
