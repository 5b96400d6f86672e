//! One-shot lifecycle signals
//!
//! A [`Signal`] starts unset and can be set exactly once. Any number of
//! threads can block until it is set. It is built on the channel-close
//! pattern: the signal owns the only [`Sender`] of a zero-capacity
//! crossbeam channel and drops it when set, which wakes every receiver with
//! a disconnect. Because waiters hold a plain [`Receiver`], they can also wait
//! on several signals at once with [`crossbeam_channel::select!`].
//!
//! [`LifecycleSynchronizer`] groups the four signals that sequence a run:
//!
//! ```text
//!   launcher                 coordinator               ingestion
//!   --------                 -----------               ---------
//!   build ok -> build_done --> wait build_done
//!                             spawn server / bind ok
//!   wait execute_permitted <-- permit_execute
//!   run worker  ......................................> accept, decode
//!                             live view <------------- stream_closed
//!   failure -> aborted ------> stop waiting
//! ```

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// A boolean that goes from false to true once and is never reset.
#[derive(Debug)]
pub struct Signal {
    name: &'static str,
    trigger: Mutex<Option<Sender<()>>>,
    observer: Receiver<()>,
}

impl Signal {
    pub fn new(name: &'static str) -> Self {
        let (tx, rx) = bounded(0);
        Self {
            name,
            trigger: Mutex::new(Some(tx)),
            observer: rx,
        }
    }

    /// Set the signal, waking all waiters. Returns `false` if it was
    /// already set; a second call changes nothing.
    pub fn set(&self) -> bool {
        let sender = self
            .trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match sender {
            Some(sender) => {
                drop(sender);
                tracing::trace!(signal = self.name, "Signal set");
                true
            }
            None => false,
        }
    }

    pub fn is_set(&self) -> bool {
        self.trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Block until the signal is set.
    pub fn wait(&self) {
        // Nothing is ever sent, so recv only returns once the sender is gone.
        let _ = self.observer.recv();
    }

    /// Block until the signal is set or `timeout` elapses. Returns whether
    /// the signal is set.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match self.observer.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => false,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }

    /// Receiver that becomes ready (disconnected) once the signal is set.
    /// For use in `select!`.
    pub fn observer(&self) -> &Receiver<()> {
        &self.observer
    }
}

/// Cross-thread signals that sequence one run.
///
/// Cheap to clone; all clones share the same signals.
#[derive(Debug, Clone)]
pub struct LifecycleSynchronizer {
    inner: Arc<Signals>,
}

#[derive(Debug)]
struct Signals {
    build_done: Signal,
    execute_permitted: Signal,
    stream_closed: Signal,
    aborted: Signal,
}

impl Default for LifecycleSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleSynchronizer {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Signals {
                build_done: Signal::new("build_done"),
                execute_permitted: Signal::new("execute_permitted"),
                stream_closed: Signal::new("stream_closed"),
                aborted: Signal::new("aborted"),
            }),
        }
    }

    /// Set by the launcher once the worker binary is built
    pub fn set_build_done(&self) {
        self.inner.build_done.set();
    }

    pub fn wait_build_done(&self) {
        self.inner.build_done.wait();
    }

    /// Set by the coordinator once the ingestion server is listening
    pub fn permit_execute(&self) {
        self.inner.execute_permitted.set();
    }

    pub fn wait_execute_permitted(&self) {
        self.inner.execute_permitted.wait();
    }

    /// Set by the ingestion server when the point stream has ended
    pub fn set_stream_closed(&self) {
        self.inner.stream_closed.set();
    }

    pub fn wait_stream_closed(&self) {
        self.inner.stream_closed.wait();
    }

    /// Set by the launcher when the build or the worker failed
    pub fn abort(&self) {
        if self.inner.aborted.set() {
            tracing::debug!("Run aborted");
        }
    }

    pub fn build_done(&self) -> &Signal {
        &self.inner.build_done
    }

    pub fn execute_permitted(&self) -> &Signal {
        &self.inner.execute_permitted
    }

    pub fn stream_closed(&self) -> &Signal {
        &self.inner.stream_closed
    }

    pub fn aborted(&self) -> &Signal {
        &self.inner.aborted
    }
}
