//! Socket ingestion of the worker's point stream
//!
//! The worker connects as a TCP client and writes one point per line:
//!
//! ```text
//! 0.25 -1.5
//! 0.5,-1.25
//! ```
//!
//! Two finite numbers separated by whitespace and/or one comma, `\n` or
//! `\r\n` terminated. Blank lines are skipped and a last line without a
//! terminator is accepted at EOF. The stream ends when the worker closes the
//! connection.
//!
//! Only one connection is served: the listener is dropped as soon as it has
//! been accepted, so a second worker is refused by the OS. A malformed record
//! or a read error ends the stream early; everything decoded until then is
//! kept.

use crate::backend::collection::SharedCollection;
use crate::backend::signal::LifecycleSynchronizer;
use crate::error::{Result, ResultExt, StreamError};
use crate::types::Point;
use std::io::{BufRead, BufReader, Read};
use std::net::{SocketAddr, TcpListener};

/// Longest accepted record, terminator excluded
pub const MAX_RECORD_LEN: usize = 256;

/// How a point stream ended
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEnd {
    /// The worker closed the connection
    Eof,
    /// A record could not be decoded; the connection was dropped
    Malformed { line: u64, reason: String },
    /// Accept or read failed
    ConnectionError(String),
}

impl StreamEnd {
    pub fn is_clean(&self) -> bool {
        matches!(self, StreamEnd::Eof)
    }

    /// The error this ending corresponds to, if any
    pub fn to_error(&self) -> Option<StreamError> {
        match self {
            StreamEnd::Eof => None,
            StreamEnd::Malformed { line, reason } => Some(StreamError::MalformedRecord {
                line: *line,
                reason: reason.clone(),
            }),
            StreamEnd::ConnectionError(msg) => Some(StreamError::Connection(msg.clone())),
        }
    }
}

/// Summary of one served connection
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub peer: Option<SocketAddr>,
    pub records: u64,
    pub end: StreamEnd,
}

/// Decode point records from `reader` into `collection` until EOF or the
/// first bad record. Returns the number of points appended and how the
/// stream ended. Does not close the collection.
pub fn ingest_stream<R: BufRead>(mut reader: R, collection: &SharedCollection) -> (u64, StreamEnd) {
    let mut buf = Vec::with_capacity(64);
    let mut line_no = 0u64;
    let mut records = 0u64;

    loop {
        buf.clear();
        let read = (&mut reader)
            .take(MAX_RECORD_LEN as u64 + 2)
            .read_until(b'\n', &mut buf);
        let n = match read {
            Ok(n) => n,
            Err(e) => return (records, StreamEnd::ConnectionError(e.to_string())),
        };
        if n == 0 {
            return (records, StreamEnd::Eof);
        }
        line_no += 1;

        match decode_record(&buf) {
            Ok(Some(point)) => {
                if collection.append(point) {
                    records += 1;
                    tracing::trace!("Received point {}: {}", records, point);
                }
            }
            Ok(None) => {}
            Err(reason) => {
                return (
                    records,
                    StreamEnd::Malformed {
                        line: line_no,
                        reason,
                    },
                )
            }
        }
    }
}

/// Decode one raw line (terminator included, if any). `Ok(None)` for blank
/// lines.
pub fn decode_record(raw: &[u8]) -> std::result::Result<Option<Point>, String> {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if line.len() > MAX_RECORD_LEN {
        return Err(format!("record longer than {} bytes", MAX_RECORD_LEN));
    }

    let text = std::str::from_utf8(line).map_err(|_| "record is not valid UTF-8".to_string())?;
    if text.trim().is_empty() {
        return Ok(None);
    }
    text.parse::<Point>().map(Some)
}

/// Accepts the worker's connection and feeds its points into a
/// [`SharedCollection`]
#[derive(Debug)]
pub struct IngestionServer {
    listener: TcpListener,
}

impl IngestionServer {
    /// Bind the listener. Port 0 picks an ephemeral port; use
    /// [`local_addr`](Self::local_addr) to find out which.
    pub fn bind(address: &str, port: u16) -> Result<Self> {
        let listener = TcpListener::bind((address, port))
            .with_context(|| format!("Binding ingestion server to {}:{}", address, port))?;
        let server = Self { listener };
        tracing::info!("Ingestion server listening on {}", server.local_addr()?);
        Ok(server)
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Querying ingestion server address")
    }

    /// Serve exactly one connection, then close the collection and signal
    /// `stream_closed`. Never fails: errors end the stream and are reported
    /// in the returned [`IngestReport`].
    pub fn serve(self, collection: &SharedCollection, sync: &LifecycleSynchronizer) -> IngestReport {
        let report = self.serve_one(collection);

        match &report.end {
            StreamEnd::Eof => tracing::info!(
                "Point stream closed by worker after {} points",
                report.records
            ),
            StreamEnd::Malformed { line, reason } => tracing::warn!(
                "Malformed record on line {} ({}), ending stream after {} points",
                line,
                reason,
                report.records
            ),
            StreamEnd::ConnectionError(msg) => tracing::error!(
                "Connection error ({}), ending stream after {} points",
                msg,
                report.records
            ),
        }

        collection.mark_closed();
        sync.set_stream_closed();
        report
    }

    fn serve_one(self, collection: &SharedCollection) -> IngestReport {
        let accepted = self.listener.accept();
        // Refuse any further worker
        drop(self.listener);

        let (stream, peer) = match accepted {
            Ok(accepted) => accepted,
            Err(e) => {
                return IngestReport {
                    peer: None,
                    records: 0,
                    end: StreamEnd::ConnectionError(format!("accept failed: {}", e)),
                }
            }
        };
        tracing::info!("Worker connected from {}", peer);

        let (records, end) = ingest_stream(BufReader::new(stream), collection);
        IngestReport {
            peer: Some(peer),
            records,
            end,
        }
    }
}
