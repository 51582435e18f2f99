//! Execution control.
//!
//! Start and continue are gated on the board being halted; stop and reset
//! are honoured in any state. None of the four commands reads a reply.

use log::debug;

use super::Board;
use crate::wire::Op;

impl Board {
    /// Commences execution for `steps` steps.
    ///
    /// A count of zero runs until a breakpoint or halt. Ignored unless the
    /// board is halted.
    pub fn start(&self, steps: u32) {
        let mut link = self.link.lock();
        if !Self::probe_with(&mut link).status.halted() {
            debug!("start ignored; board not halted");
            return;
        }
        link.write_byte(Op::Start.code());
        link.write_word(4, steps);
    }

    /// Resumes execution after a halt.
    ///
    /// Ignored unless the board is halted.
    pub fn resume(&self) {
        let mut link = self.link.lock();
        if !Self::probe_with(&mut link).status.halted() {
            debug!("continue ignored; board not halted");
            return;
        }
        link.write_byte(Op::Continue.code());
    }

    /// Halts execution.
    pub fn pause(&self) {
        self.link.lock().write_byte(Op::Stop.code());
    }

    /// Resets the board.
    pub fn reset(&self) {
        self.link.lock().write_byte(Op::Reset.code());
    }
}
