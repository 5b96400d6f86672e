//! Run coordination
//!
//! [`Coordinator`] wires the components together for one run:
//!
//! 1. Bind the ingestion listener
//! 2. Spawn the `worker-launcher` thread, which builds the worker
//! 3. Wait for `build_done` (or `aborted`)
//! 4. Spawn the `ingestion-server` thread, then grant `execute_permitted`
//! 5. Drive the live view on the calling thread until the stream ends
//! 6. Join the launcher and export the result
//!
//! A failed build or worker run is fatal: the error is returned and no result
//! file is written. The same holds for a worker that exits successfully but
//! leaves the stream open past `stream_close_timeout_ms`; the launcher thread
//! enforces that timeout and aborts the run.

use crate::analysis::{read_result, ResultProcessor};
use crate::backend::{
    IngestReport, IngestionServer, LaunchReport, LifecycleSynchronizer, ProcessRunner,
    SharedCollection, WorkerLauncher,
};
use crate::config::AppConfig;
use crate::error::{Result, ResultExt, StreamError};
use crate::frontend::{LiveView, PlotRenderer};
use crossbeam_channel::select;
use std::net::{SocketAddr, TcpStream};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Summary of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub launch: LaunchReport,
    pub ingest: IngestReport,
    pub exported_rows: usize,
    pub output: PathBuf,
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "build {:.2?}, worker {:.3}s, {} points received, {} rows written to {}",
            self.launch.build_elapsed,
            self.launch.elapsed.as_secs_f64(),
            self.ingest.records,
            self.exported_rows,
            self.output.display()
        )
    }
}

/// Runs the build, execute, ingest and export lifecycle
pub struct Coordinator {
    config: AppConfig,
    runner: Arc<dyn ProcessRunner>,
}

impl Coordinator {
    pub fn new(config: AppConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Execute one full run, rendering live frames through `renderer`
    pub fn run(&self, renderer: &mut dyn PlotRenderer) -> Result<RunReport> {
        let collection = SharedCollection::new();
        let sync = LifecycleSynchronizer::new();

        let server = IngestionServer::bind(&self.config.server.bind_address, self.config.server.port)?;
        let addr = server.local_addr()?;

        let launcher = WorkerLauncher::from_config(&self.config, self.runner.clone());
        let close_timeout = self.config.stream_close_timeout();
        let launcher_handle = {
            let sync = sync.clone();
            let address = addr.ip().to_string();
            thread::Builder::new()
                .name("worker-launcher".to_string())
                .spawn(move || {
                    let _unwind = AbortOnUnwind(sync.clone());
                    let launch = launcher.build_and_run(&address, addr.port(), &sync)?;
                    // The stream must end shortly after the worker exits
                    if !sync.stream_closed().wait_timeout(close_timeout) {
                        let err = StreamError::Connection(
                            "worker exited without closing the point stream".to_string(),
                        );
                        tracing::error!("{}. Exiting", err);
                        sync.abort();
                        return Err(err);
                    }
                    Ok(launch)
                })
                .context("Spawning worker launcher thread")?
        };

        select! {
            recv(sync.build_done().observer()) -> _ => {}
            recv(sync.aborted().observer()) -> _ => {
                return Err(match join_launcher(launcher_handle) {
                    Err(e) => e,
                    Ok(_) => StreamError::Aborted,
                });
            }
        }

        let ingest_handle = {
            let collection = collection.clone();
            let sync = sync.clone();
            thread::Builder::new()
                .name("ingestion-server".to_string())
                .spawn(move || server.serve(&collection, &sync))
        };
        let ingest_handle = match ingest_handle {
            Ok(handle) => handle,
            Err(e) => {
                sync.abort();
                let _ = join_launcher(launcher_handle);
                return Err(StreamError::Io(e).with_context("Spawning ingestion server thread"));
            }
        };

        tracing::debug!("Ingestion server running, permitting worker execution");
        sync.permit_execute();

        let outcome = LiveView::from_config(&self.config.view).run(&collection, &sync, renderer);
        tracing::debug!("Live view finished: {:?}", outcome);

        let launch = match join_launcher(launcher_handle) {
            Ok(launch) => launch,
            Err(e) => {
                release_listener(&sync, addr);
                return Err(e);
            }
        };

        let ingest = ingest_handle
            .join()
            .map_err(|_| StreamError::Connection("ingestion thread panicked".to_string()))?;
        if let Some(e) = ingest.end.to_error() {
            tracing::warn!("Point stream ended early: {}", e);
        }

        let processed = ResultProcessor::from_config(&self.config).finalize(&collection)?;

        Ok(RunReport {
            launch,
            ingest,
            exported_rows: processed.exported_rows,
            output: processed.output,
        })
    }

    /// Render an existing result file once, without building or running the
    /// worker. Returns the number of points shown.
    pub fn plot_only(&self, renderer: &mut dyn PlotRenderer) -> Result<usize> {
        let output = &self.config.worker.output;
        let collection = SharedCollection::from_points(read_result(output)?);

        LiveView::from_config(&self.config.view).show_final(&collection, renderer);
        tracing::info!("Plotted {} points from {:?}", collection.len(), output);
        Ok(collection.len())
    }
}

/// Sets `aborted` when the launcher thread unwinds, so the coordinator never
/// waits for a `build_done` that will not come
struct AbortOnUnwind(LifecycleSynchronizer);

impl Drop for AbortOnUnwind {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.abort();
        }
    }
}

fn join_launcher(handle: JoinHandle<Result<LaunchReport>>) -> Result<LaunchReport> {
    handle.join().unwrap_or_else(|_| {
        tracing::error!("Worker launcher thread panicked");
        Err(StreamError::Aborted)
    })
}

/// Unblock an ingestion thread still waiting in `accept` after the worker
/// went away without connecting
fn release_listener(sync: &LifecycleSynchronizer, addr: SocketAddr) {
    if sync.stream_closed().is_set() {
        return;
    }
    if TcpStream::connect(addr).is_ok() {
        tracing::debug!("Released idle ingestion listener on {}", addr);
    }
}
