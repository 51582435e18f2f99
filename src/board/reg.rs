//! Register read-back.

use std::array;

use log::warn;

use super::Board;
use crate::wire::Op;

/// Registers exposed by the board (r0-r14 plus the program counter).
pub const COUNT: usize = 16;

impl Board {
    /// Reads all registers, rendered as `0x`-prefixed uppercase words.
    ///
    /// A short read leaves the missing registers zeroed.
    #[must_use]
    pub fn registers(&self) -> [String; COUNT] {
        let mut link = self.link.lock();
        link.write_byte(Op::RegGet.code());
        link.write_word(4, 0);
        link.write_word(2, COUNT as u32);
        let mut data = [0; COUNT * 4];
        let count = link.read_bytes(&mut data);
        if count < data.len() {
            warn!("short register read: {count} of {} bytes", data.len());
        }
        array::from_fn(|reg| {
            let word = data[reg * 4..][..4]
                .iter()
                .rev()
                .fold(0u32, |word, &byte| word << 8 | u32::from(byte));
            format!("0x{word:08X}")
        })
    }
}
