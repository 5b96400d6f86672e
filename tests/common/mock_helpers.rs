//! Fake process runner standing in for the build tool and the worker

use displacement_stream::backend::{CommandLine, ProcessOutcome, ProcessRunner};
use displacement_stream::Result;
use std::io::Write;
use std::net::TcpStream;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// What the fake worker does once started
#[derive(Debug, Clone)]
pub enum WorkerScript {
    /// Connect to the ingestion server and write these bytes, then close
    Stream(Vec<u8>),
    /// Never connect
    Silent,
}

/// [`ProcessRunner`] that fakes `scons` and the worker binary
pub struct FakeRunner {
    build_exit: i32,
    worker_exit: i32,
    script: WorkerScript,
    calls: Mutex<Vec<CommandLine>>,
}

impl FakeRunner {
    pub fn streaming(payload: Vec<u8>) -> Self {
        Self {
            build_exit: 0,
            worker_exit: 0,
            script: WorkerScript::Stream(payload),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn silent() -> Self {
        Self {
            script: WorkerScript::Silent,
            ..Self::streaming(Vec::new())
        }
    }

    pub fn build_exit(mut self, code: i32) -> Self {
        self.build_exit = code;
        self
    }

    pub fn worker_exit(mut self, code: i32) -> Self {
        self.worker_exit = code;
        self
    }

    pub fn calls(&self) -> Vec<CommandLine> {
        self.calls.lock().unwrap().clone()
    }

    fn run_worker(&self, command: &CommandLine) {
        let WorkerScript::Stream(payload) = &self.script else {
            return;
        };
        let args = command.args_lossy();
        let address = format!("{}:{}", args[2], args[3]);
        let mut stream = TcpStream::connect(address).expect("worker could not connect");
        stream.write_all(payload).expect("worker could not write");
    }
}

impl ProcessRunner for FakeRunner {
    fn run(&self, command: &CommandLine) -> Result<ProcessOutcome> {
        self.calls.lock().unwrap().push(command.clone());
        let start = Instant::now();

        let exit_code = if command.program == Path::new("scons") {
            self.build_exit
        } else {
            self.run_worker(command);
            self.worker_exit
        };

        Ok(ProcessOutcome {
            exit_code,
            elapsed: start.elapsed().max(Duration::from_micros(1)),
        })
    }
}
