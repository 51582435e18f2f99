//! Framed pipe I/O.
//!
//! A [`Link`] is the host endpoint of the board's pipe pair. Rather than
//! touching the child's file descriptors directly, it speaks through a pair
//! of channels bridged to the pipes by the [supervisor](crate::spawn)'s I/O
//! threads; every wait is bounded, so no exchange can stall the host
//! indefinitely. Integers cross the wire least-significant byte first.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender, TrySendError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

/// Bound on a single poll of the inbound pipe.
pub const READ_TIMEOUT: Duration = Duration::from_millis(1000);
/// Bound on queueing a write to the outbound pipe.
pub const WRITE_TIMEOUT: Duration = Duration::from_millis(100);
/// Backoff between retries of a refused write.
const RETRY: Duration = Duration::from_millis(5);

/// Widest integer carried on the wire, in bytes.
pub const WORD: usize = 4;
/// Outbound queue depth before writes start waiting.
const DEPTH: usize = 64;

/// Host endpoint of the board's pipe pair.
#[derive(Debug)]
pub struct Link {
    /// Outbound queue, drained into the board's stdin.
    tx: SyncSender<Vec<u8>>,
    /// Inbound queue, fed from the board's stdout.
    rx: Receiver<Vec<u8>>,
    /// Received bytes not yet consumed.
    buf: VecDeque<u8>,
}

/// Far side of a [`Link`], handed to the supervisor's pipe threads (or to an
/// in-process double under test).
#[derive(Debug)]
pub struct Remote {
    /// Receives host-to-board traffic.
    pub rx: Receiver<Vec<u8>>,
    /// Injects board-to-host bytes.
    pub tx: Sender<Vec<u8>>,
}

/// Constructs a connected link/remote pair.
#[must_use]
pub fn pair() -> (Link, Remote) {
    let (out_tx, out_rx) = mpsc::sync_channel(DEPTH);
    let (in_tx, in_rx) = mpsc::channel();
    (Link::new(out_tx, in_rx), Remote {
        rx: out_rx,
        tx: in_tx,
    })
}

impl Link {
    /// Constructs a link over the provided queue endpoints.
    #[must_use]
    pub fn new(tx: SyncSender<Vec<u8>>, rx: Receiver<Vec<u8>>) -> Self {
        Self {
            tx,
            rx,
            buf: VecDeque::new(),
        }
    }

    /// Writes raw bytes towards the board.
    ///
    /// Waits up to [`WRITE_TIMEOUT`] for room in the outbound queue; on
    /// timeout (or when the far side is gone) the write is dropped with a
    /// diagnostic. Never blocks indefinitely.
    pub fn write_bytes(&mut self, data: &[u8]) {
        // Zero-length chunks double as end-of-stream markers; never send one
        if data.is_empty() {
            return;
        }
        let deadline = Instant::now() + WRITE_TIMEOUT;
        let mut msg = data.to_vec();
        loop {
            match self.tx.try_send(msg) {
                Ok(()) => return,
                Err(TrySendError::Full(back)) => {
                    if Instant::now() >= deadline {
                        warn!("board not responding; dropped write of {} bytes", back.len());
                        return;
                    }
                    msg = back;
                    thread::sleep(RETRY);
                }
                Err(TrySendError::Disconnected(back)) => {
                    warn!("pipe write error; dropped write of {} bytes", back.len());
                    return;
                }
            }
        }
    }

    /// Writes a single byte towards the board.
    pub fn write_byte(&mut self, byte: u8) {
        self.write_bytes(&[byte]);
    }

    /// Writes the low `count` bytes of a word, least-significant first.
    ///
    /// Counts beyond [`WORD`] are clipped.
    pub fn write_word(&mut self, count: usize, value: u32) {
        let count = count.min(WORD);
        self.write_bytes(&value.to_le_bytes()[..count]);
    }

    /// Reads raw bytes from the board into `buf`.
    ///
    /// Polls the inbound queue with a [`READ_TIMEOUT`] bound per chunk,
    /// returning the (possibly short) count read on timeout or end of
    /// stream. Never blocks indefinitely.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> usize {
        let mut count = 0;
        while count < buf.len() {
            if let Some(byte) = self.buf.pop_front() {
                buf[count] = byte;
                count += 1;
                continue;
            }
            match self.rx.recv_timeout(READ_TIMEOUT) {
                Ok(chunk) => {
                    // A zero-length read means the pipe has closed
                    if chunk.is_empty() {
                        break;
                    }
                    self.buf.extend(chunk);
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!("board not responding; short read of {count} bytes");
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("pipe closed; short read of {count} bytes");
                    break;
                }
            }
        }
        count
    }

    /// Reads a single byte from the board.
    pub fn read_byte(&mut self) -> Option<u8> {
        let mut buf = [0];
        (self.read_bytes(&mut buf) == buf.len()).then(|| buf[0])
    }

    /// Reads `count` bytes, assembled least-significant first.
    ///
    /// Counts beyond [`WORD`] are clipped. Returns `None` on a short read.
    pub fn read_word(&mut self, count: usize) -> Option<u32> {
        let count = count.min(WORD);
        let mut buf = [0; WORD];
        (self.read_bytes(&mut buf[..count]) == count).then(|| {
            buf[..count]
                .iter()
                .rev()
                .fold(0, |word, &byte| word << 8 | u32::from(byte))
        })
    }
}
