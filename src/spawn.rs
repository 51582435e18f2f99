//! Child processes.
//!
//! The supervisor owns the lifecycle of the board emulator, spawned with
//! its standard streams rebound to the host's pipe pair, and runs the
//! assembler on demand. Two detached threads bridge the child's pipes to a
//! [`Link`]'s queues so that protocol waits stay bounded.

use std::io::{Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use log::{debug, error, trace, warn};
use thiserror::Error;

use crate::link::{self, Link, Remote};

/// A convenient type alias for [`Result`](std::result::Result).
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Running board child.
///
/// Dropping the session terminates and reaps the child; any read then in
/// flight observes end-of-stream and unwinds on its own.
#[derive(Debug)]
pub struct Session {
    /// Board child process.
    child: Child,
}

impl Session {
    /// Returns the child's process ID.
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.child.id()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Terminate and reap the board
        if let Err(err) = self.child.kill() {
            debug!("board already exited: {err}");
        }
        match self.child.wait() {
            Ok(status) => debug!("board exited: {status}"),
            Err(err) => warn!("failed to reap board: {err}"),
        }
    }
}

/// Spawns the board emulator, returning its session and host-side link.
///
/// The child's descriptors 0 and 1 become the board ends of the pipe pair.
///
/// # Errors
///
/// Errors when the child or its pipe threads cannot be started.
pub fn board(path: &Path) -> Result<(Session, Link)> {
    let mut child = Command::new(path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .map_err(Error::Spawn)?;
    debug!("spawned board: `{}` (pid {})", path.display(), child.id());

    let stdin = child.stdin.take().ok_or(Error::Pipes)?;
    let stdout = child.stdout.take().ok_or(Error::Pipes)?;

    // Bridge the pipes to the link's queues
    let (link, Remote { rx, tx }) = link::pair();
    thread::Builder::new()
        .name("board-tx".to_string())
        .spawn(move || writer(stdin, &rx))
        .map_err(Error::Thread)?;
    thread::Builder::new()
        .name("board-rx".to_string())
        .spawn(move || reader(stdout, &tx))
        .map_err(Error::Thread)?;

    Ok((Session { child }, link))
}

/// Drains the outbound queue into the child's stdin.
fn writer(mut stdin: ChildStdin, rx: &Receiver<Vec<u8>>) {
    while let Ok(chunk) = rx.recv() {
        if let Err(err) = stdin.write_all(&chunk).and_then(|()| stdin.flush()) {
            error!("pipe write error: {err}");
            break;
        }
        trace!("wrote {} bytes", chunk.len());
    }
    // Link gone or board gone; dropping stdin signals end-of-stream
}

/// Pumps the child's stdout into the inbound queue.
fn reader(mut stdout: ChildStdout, tx: &Sender<Vec<u8>>) {
    let mut buf = [0; 4096];
    loop {
        match stdout.read(&mut buf) {
            // End-of-stream: board exited
            Ok(0) => break,
            Ok(count) => {
                trace!("read {count} bytes");
                if tx.send(buf[..count].to_vec()).is_err() {
                    break;
                }
            }
            Err(err) => {
                error!("pipe read error: {err}");
                break;
            }
        }
    }
}

/// Runs the assembler over a source file, producing a listing at `out`.
///
/// Waits for the assembler to exit. On success the captured output is
/// returned for the caller to surface; on a non-zero exit it rides along in
/// the error instead.
///
/// # Errors
///
/// Errors when the assembler cannot be run or exits unsuccessfully.
pub fn assemble(bin: &Path, source: &Path, out: &Path) -> Result<String> {
    let output = Command::new(bin)
        .arg("-lk")
        .arg(out)
        .arg(source)
        .stdin(Stdio::null())
        .output()
        .map_err(Error::Spawn)?;

    // Fold both streams into one transcript
    let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
    log.push_str(&String::from_utf8_lossy(&output.stderr));

    if output.status.success() {
        debug!("assembled `{}` into `{}`", source.display(), out.display());
        Ok(log)
    } else {
        Err(Error::Assemble {
            status: output.status,
            log,
        })
    }
}

/// An error caused by supervising a child process.
#[derive(Debug, Error)]
pub enum Error {
    /// Child could not be spawned.
    #[error("failed to spawn child")]
    Spawn(#[source] std::io::Error),
    /// Child was spawned without its pipe pair.
    #[error("child is missing its pipes")]
    Pipes,
    /// Pipe thread could not be started.
    #[error("failed to start pipe thread")]
    Thread(#[source] std::io::Error),
    /// Assembler exited unsuccessfully.
    #[error("assembler failed ({status}): {log}")]
    Assemble {
        /// The assembler's exit status.
        status: ExitStatus,
        /// Captured assembler output.
        log: String,
    },
}
