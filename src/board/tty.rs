//! Terminal relay.
//!
//! The board multiplexes a virtual terminal over the control pipes: output
//! is polled in length-prefixed chunks, input travels one acknowledged byte
//! at a time.

use log::trace;

use super::Board;
use crate::wire::Op;

/// Terminal number used by this host.
const TERMINAL: u8 = 0;
/// Largest chunk requested per output poll.
const CHUNK: u8 = 32;

impl Board {
    /// Drains pending terminal output from the board.
    ///
    /// Polls until the board answers an empty chunk (or stops answering),
    /// accumulating everything received.
    #[must_use]
    pub fn pull(&self) -> String {
        let mut link = self.link.lock();
        let mut out = Vec::new();
        loop {
            link.write_byte(Op::TtyGet.code());
            link.write_byte(TERMINAL);
            link.write_byte(CHUNK);
            let Some(length) = link.read_byte() else {
                break;
            };
            if length == 0 {
                break;
            }
            let mut chunk = vec![0; length.into()];
            let count = link.read_bytes(&mut chunk);
            out.extend_from_slice(&chunk[..count]);
            if count < chunk.len() {
                break;
            }
        }
        String::from_utf8_lossy(&out).into_owned()
    }

    /// Forwards one keystroke to the board's terminal.
    ///
    /// Accepts printable ASCII plus newline, backspace, tab, and bell;
    /// anything else is rejected without wire traffic. The board's
    /// acknowledgement byte is awaited but its value carries no meaning.
    pub fn push(&self, code: u32) -> bool {
        #[allow(clippy::cast_possible_truncation)]
        let byte = match code {
            0x20..=0x7F | 0x0A | 0x08 | 0x09 | 0x07 => code as u8,
            _ => {
                trace!("rejected key code {code:#x}");
                return false;
            }
        };
        let mut link = self.link.lock();
        link.write_byte(Op::TtyPut.code());
        link.write_byte(TERMINAL);
        link.write_byte(1);
        link.write_byte(byte);
        let _ = link.read_byte();
        true
    }
}
