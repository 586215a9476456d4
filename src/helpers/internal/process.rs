//! Child process execution with an optional deadline
//!
//! Output is drained on background threads so a chatty child cannot block on
//! a full pipe while we wait for it.

use std::io::{self, Read};
use std::process::{Child, Command, Output, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;
use thiserror::Error;
use wait_timeout::ChildExt;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("{program} not found (is it installed and on PATH?)")]
    NotFound { program: String },

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} timed out after {} seconds", timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },

    #[error("I/O error while running {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Run `cmd` to completion, capturing stdout and stderr.
///
/// With `timeout` set, a child still running at the deadline is killed and
/// [`RunError::TimedOut`] returned. A non-zero exit is not an error here;
/// callers inspect `Output::status`.
pub fn run_captured(cmd: &mut Command, timeout: Option<Duration>) -> Result<Output, RunError> {
    let program = cmd.get_program().to_string_lossy().to_string();

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            RunError::NotFound {
                program: program.clone(),
            }
        } else {
            RunError::Spawn {
                program: program.clone(),
                source,
            }
        }
    })?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = match wait(&mut child, timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(RunError::TimedOut {
                program,
                timeout: timeout.unwrap_or_default(),
            });
        }
        Err(source) => return Err(RunError::Io { program, source }),
    };

    Ok(Output {
        status,
        stdout: join(stdout),
        stderr: join(stderr),
    })
}

fn wait(child: &mut Child, timeout: Option<Duration>) -> io::Result<Option<std::process::ExitStatus>> {
    match timeout {
        Some(timeout) => child.wait_timeout(timeout),
        None => child.wait().map(Some),
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn join(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}
