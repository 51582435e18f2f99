//! Breakpoint table.
//!
//! The board exposes 32 breakpoint slots through two bitmaps: `active`
//! marks slots holding a live breakpoint, and `defined` marks slots the
//! board is willing to accept definitions into; a free slot is defined but
//! not active. Both bitmaps are authoritative on the board, and the host
//! only ever reads them back.

use indexmap::IndexSet;
use log::debug;

use super::Board;
use crate::link::Link;
use crate::wire::Op;

/// Breakpoint slots exposed by the board.
pub const SLOTS: usize = 32;

/// One slot of the board's breakpoint table.
///
/// Only the primary address means anything to this host; the remaining
/// fields exist to keep the slot's legacy wire layout intact and travel
/// verbatim.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Breakpoint {
    /// Trigger address.
    pub address: u32,
    /// Secondary address bound (unused, all-ones).
    pub address2: [u8; 4],
    /// Primary data qualifier (unused, zero).
    pub data: [u8; 8],
    /// Secondary data qualifier (unused, zero).
    pub data2: [u8; 8],
    /// Slot flags (unused, all-ones).
    pub misc: u16,
}

impl Breakpoint {
    /// Creates a slot record trapping on `address` alone.
    #[must_use]
    pub fn at(address: u32) -> Self {
        Self {
            address,
            address2: [0xFF; 4],
            data: [0; 8],
            data2: [0; 8],
            misc: u16::MAX,
        }
    }
}

impl Default for Breakpoint {
    fn default() -> Self {
        Self::at(0)
    }
}

impl Board {
    /// Sets or clears the breakpoint at an address.
    ///
    /// Toggle semantics: when any live slot already traps `addr`, that slot
    /// is cleared and `false` is returned. Otherwise the lowest free slot is
    /// claimed and `true` is returned. `false` also covers a full table and
    /// a board that stopped answering.
    pub fn toggle(&self, addr: u32) -> bool {
        let mut link = self.link.lock();
        let Some((active, defined)) = Self::bp_status(&mut link) else {
            return false;
        };

        // Clear the live slot already trapping this address, if any; at
        // most one can match
        for slot in 0..SLOTS as u8 {
            if active >> slot & 1 == 0 {
                continue;
            }
            let Some(bpt) = Self::bp_read(&mut link, slot) else {
                continue;
            };
            if bpt.address == addr {
                Self::bp_update(&mut link, 0, 1 << slot);
                return false;
            }
        }

        // Otherwise claim the lowest free slot
        let free = !active & defined;
        if free == 0 {
            debug!("breakpoint table full");
            return false;
        }
        #[allow(clippy::cast_possible_truncation)]
        let slot = free.trailing_zeros() as u8;
        Self::bp_write(&mut link, slot, &Breakpoint::at(addr));
        true
    }

    /// Lists the addresses of all live breakpoints.
    ///
    /// A slot read failure truncates the result without erroring.
    #[must_use]
    pub fn breakpoints(&self) -> IndexSet<u32> {
        let mut link = self.link.lock();
        Self::breakpoints_with(&mut link)
    }

    /// Breakpoint listing against an already-held link.
    pub(super) fn breakpoints_with(link: &mut Link) -> IndexSet<u32> {
        let mut set = IndexSet::new();
        let Some((active, _)) = Self::bp_status(link) else {
            return set;
        };
        for slot in 0..SLOTS as u8 {
            if active >> slot & 1 == 0 {
                continue;
            }
            match Self::bp_read(link, slot) {
                Some(bpt) => {
                    set.insert(bpt.address);
                }
                None => break,
            }
        }
        set
    }

    /// Queries the `(active, defined)` bitmaps.
    fn bp_status(link: &mut Link) -> Option<(u32, u32)> {
        link.write_byte(Op::BpGet.code());
        Some((link.read_word(4)?, link.read_word(4)?))
    }

    /// Reads back one slot's definition.
    fn bp_read(link: &mut Link, slot: u8) -> Option<Breakpoint> {
        link.write_byte(Op::BpRead.code());
        link.write_byte(slot);
        #[allow(clippy::cast_possible_truncation)]
        let misc = link.read_word(2)? as u16;
        let address = link.read_word(4)?;
        let address2 = read_array(link)?;
        let data = read_array(link)?;
        let data2 = read_array(link)?;
        Some(Breakpoint {
            address,
            address2,
            data,
            data2,
            misc,
        })
    }

    /// Updates the bitmaps by `(clear, set)` masks.
    fn bp_update(link: &mut Link, clear: u32, set: u32) {
        link.write_byte(Op::BpSet.code());
        link.write_word(4, clear);
        link.write_word(4, set);
    }

    /// Writes one slot's full definition.
    fn bp_write(link: &mut Link, slot: u8, bpt: &Breakpoint) {
        link.write_byte(Op::BpWrite.code());
        link.write_byte(slot);
        link.write_word(2, bpt.misc.into());
        link.write_word(4, bpt.address);
        link.write_bytes(&bpt.address2);
        link.write_bytes(&bpt.data);
        link.write_bytes(&bpt.data2);
    }
}

/// Reads an exact-length byte array, or `None` on a short read.
fn read_array<const N: usize>(link: &mut Link) -> Option<[u8; N]> {
    let mut buf = [0; N];
    (link.read_bytes(&mut buf) == N).then_some(buf)
}
