//! Board session.
//!
//! A [`Board`] drives one live emulator over its [`Link`]. Every exchange,
//! opcode byte through last reply byte, runs under the protocol mutex, so
//! concurrent callers (the foreground controller and the terminal relay)
//! never interleave requests on the wire.

use log::{trace, warn};
use parking_lot::Mutex;

use crate::link::Link;
use crate::wire::{Op, Status};

mod bpt;
mod exec;
mod mem;
mod reg;
mod tty;

pub use self::bpt::{Breakpoint, SLOTS};
pub use self::mem::{ROWS, Row};

/// Live session with a board.
#[derive(Debug)]
pub struct Board {
    /// Protocol mutex guarding the pipe pair.
    link: Mutex<Link>,
}

impl Board {
    /// Constructs a session over a connected link.
    #[must_use]
    pub fn new(link: Link) -> Self {
        Self {
            link: Mutex::new(link),
        }
    }

    /// Queries the board's status word.
    #[must_use]
    pub fn status(&self) -> Status {
        self.probe().status
    }

    /// Performs a full status exchange, step counters included.
    #[must_use]
    pub fn probe(&self) -> Probe {
        let mut link = self.link.lock();
        Self::probe_with(&mut link)
    }

    /// Status exchange against an already-held link.
    fn probe_with(link: &mut Link) -> Probe {
        link.write_byte(Op::Probe.code());
        let Some(status) = link.read_byte() else {
            warn!("board not responding");
            return Probe::broken();
        };
        let Some(remaining) = link.read_word(4) else {
            warn!("board not responding");
            return Probe::broken();
        };
        let Some(elapsed) = link.read_word(4) else {
            warn!("board not responding");
            return Probe::broken();
        };
        let probe = Probe {
            status: status.into(),
            remaining,
            elapsed,
        };
        trace!("probe: {probe:?}");
        probe
    }
}

/// Status word with the board's step counters.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Probe {
    /// Decoded status word.
    pub status: Status,
    /// Steps left of the current bounded run.
    pub remaining: u32,
    /// Steps executed since the last reset.
    pub elapsed: u32,
}

impl Probe {
    /// Probe synthesised when the board stops answering.
    const fn broken() -> Self {
        Self {
            status: Status::Broken,
            remaining: 0,
            elapsed: 0,
        }
    }
}
