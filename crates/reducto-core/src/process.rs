use crate::error::ReduceError;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use wait_timeout::ChildExt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
    pub timeout: Option<Duration>,
}

impl CommandLine {
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitKind {
    Exited(i32),
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub exit: ExitKind,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub elapsed: Duration,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        self.exit == ExitKind::Exited(0)
    }

    /// Last `limit` bytes of stderr, falling back to stdout when stderr is
    /// empty.
    pub fn tail(&self, limit: usize) -> String {
        let stream = if self.stderr.is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let start = stream.len().saturating_sub(limit);
        String::from_utf8_lossy(&stream[start..]).trim().to_string()
    }
}

pub fn run_command(command: &CommandLine) -> Result<RunOutcome, ReduceError> {
    let mut process = Command::new(&command.program);
    process.args(&command.args);
    if let Some(cwd) = &command.cwd {
        process.current_dir(cwd);
    }
    for (key, value) in &command.env {
        process.env(key, value);
    }
    process
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let started = Instant::now();
    let mut child = process.spawn().map_err(|source| ReduceError::Spawn {
        command: command.display(),
        source,
    })?;
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let wait_error = |source| ReduceError::Spawn {
        command: command.display(),
        source,
    };
    let exit = match command.timeout {
        Some(timeout) => match child.wait_timeout(timeout).map_err(wait_error)? {
            Some(status) => ExitKind::Exited(status.code().unwrap_or(1)),
            None => {
                child.kill().ok();
                let _ = child.wait();
                ExitKind::TimedOut
            }
        },
        None => ExitKind::Exited(child.wait().map_err(wait_error)?.code().unwrap_or(1)),
    };

    let elapsed = started.elapsed();

    // A killed child can leave grandchildren holding the pipes open.
    if exit == ExitKind::TimedOut {
        return Ok(RunOutcome {
            exit,
            stdout: Vec::new(),
            stderr: Vec::new(),
            elapsed,
        });
    }
    Ok(RunOutcome {
        exit,
        stdout: collect(stdout),
        stderr: collect(stderr),
        elapsed,
    })
}

fn drain<R>(stream: Option<R>) -> Option<JoinHandle<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    stream.map(|mut stream| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = stream.read_to_end(&mut buffer);
            buffer
        })
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}
