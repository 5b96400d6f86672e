//! Backend: worker lifecycle, point ingestion and the shared point store
//!
//! Everything here runs off the coordinator thread and talks to it through
//! [`LifecycleSynchronizer`] signals and the [`SharedCollection`].
//!
//! # Components
//!
//! - [`SharedCollection`] - Thread-safe, append-only point store with a close flag
//! - [`LifecycleSynchronizer`] / [`Signal`] - One-shot signals sequencing a run
//! - [`IngestionServer`] - Accepts the worker's connection and decodes points
//! - [`WorkerLauncher`] - Builds and runs the external worker via a [`ProcessRunner`]
//!
//! # Example
//!
//! ```ignore
//! use displacement_stream::backend::*;
//! use std::sync::Arc;
//!
//! let collection = SharedCollection::new();
//! let sync = LifecycleSynchronizer::new();
//! let server = IngestionServer::bind("127.0.0.1", 0)?;
//! let addr = server.local_addr()?;
//!
//! let launcher = WorkerLauncher::from_config(&config, Arc::new(SystemRunner));
//! let launch = {
//!     let sync = sync.clone();
//!     std::thread::spawn(move || launcher.build_and_run(&addr.ip().to_string(), addr.port(), &sync))
//! };
//!
//! sync.wait_build_done();
//! let ingest = {
//!     let (collection, sync) = (collection.clone(), sync.clone());
//!     std::thread::spawn(move || server.serve(&collection, &sync))
//! };
//! sync.permit_execute();
//! sync.wait_stream_closed();
//! ```

pub mod collection;
pub mod ingest;
pub mod launcher;
pub mod signal;

pub use collection::SharedCollection;
pub use ingest::{decode_record, ingest_stream, IngestReport, IngestionServer, StreamEnd, MAX_RECORD_LEN};
pub use launcher::{
    CommandLine, LaunchReport, ProcessOutcome, ProcessRunner, SystemRunner, WorkerLauncher,
};
pub use signal::{LifecycleSynchronizer, Signal};

#[cfg(test)]
pub use launcher::MockProcessRunner;
