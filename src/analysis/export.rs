//! Two-column result file
//!
//! One sample per line, `x y`, space separated, no header. Values use Rust's
//! shortest round-trip float formatting, so reading a file back yields the
//! exact values that were written.

use crate::error::{Result, StreamError};
use crate::types::Point;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// One exported row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportRecord {
    pub x: f64,
    pub y: f64,
}

impl From<Point> for ExportRecord {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl std::fmt::Display for ExportRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

/// Write `points` to `path`, replacing any existing file. Returns the number
/// of rows written.
pub fn write_result(path: &Path, points: &[Point]) -> Result<usize> {
    let write_err = |source| StreamError::OutputWrite {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    for &point in points {
        writeln!(writer, "{}", ExportRecord::from(point)).map_err(write_err)?;
    }
    writer.flush().map_err(write_err)?;

    tracing::info!("Wrote {} rows to {:?}", points.len(), path);
    Ok(points.len())
}

/// Read a result file written by [`write_result`]. Blank lines are skipped;
/// any other unparsable line is an error.
pub fn read_result(path: &Path) -> Result<Vec<Point>> {
    let file = File::open(path).map_err(|e| {
        StreamError::Io(e).with_context(format!("Opening result file {}", path.display()))
    })?;

    let mut points = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let point = line.parse::<Point>().map_err(|reason| StreamError::MalformedRecord {
            line: index as u64 + 1,
            reason,
        })?;
        points.push(point);
    }
    Ok(points)
}
