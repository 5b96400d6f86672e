//! # displacement-stream: build, run and record a displacement worker
//!
//! Orchestrates an external measurement worker that streams 2D displacement
//! samples back over TCP. The worker is built with an external build tool,
//! executed once the ingestion server is listening, and its point stream is
//! shown live and finally written as a two-column result file.
//!
//! ## Architecture
//!
//! - **Backend**: worker build/execute lifecycle, TCP ingestion and the shared
//!   point store, each on its own thread
//! - **Frontend**: live view polling the point store and feeding a
//!   [`PlotRenderer`](frontend::PlotRenderer)
//! - **Analysis**: dropout repair, spline resampling and result export
//! - **Communication**: one-shot signals built on crossbeam channels
//!
//! ## Configuration
//!
//! Settings are read from a TOML file, by default in the platform config
//! directory under `displacement-stream/config.toml`:
//!
//! - **Linux**: `~/.config/displacement-stream/`
//! - **macOS**: `~/Library/Application Support/displacement-stream/`
//! - **Windows**: `%APPDATA%\displacement-stream\`
//!
//! ## Example
//!
//! ```ignore
//! use displacement_stream::{
//!     app::Coordinator,
//!     backend::SystemRunner,
//!     config::AppConfig,
//!     frontend::TracingRenderer,
//! };
//! use std::sync::Arc;
//!
//! fn main() -> displacement_stream::Result<()> {
//!     let config = AppConfig::load_or_default(None)?;
//!     let coordinator = Coordinator::new(config, Arc::new(SystemRunner));
//!     let report = coordinator.run(&mut TracingRenderer::new())?;
//!     println!("{}", report);
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod frontend;
pub mod types;

// Re-export commonly used types
pub use app::{Coordinator, RunReport};
pub use backend::{LifecycleSynchronizer, SharedCollection};
pub use config::{AppConfig, WorkerConfig};
pub use error::{Result, StreamError};
pub use types::Point;
