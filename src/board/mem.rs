//! Memory transfer.
//!
//! Loading streams a parsed listing's data fields into board memory, one
//! write per field. Viewing fetches a raw window of board memory and merges
//! it with the listing into display rows: rows whose address matches a
//! listing line show that line's bytes and source text; the rest fall back
//! to a zero word and an ellipsis.

use std::fmt::Write as _;

use log::warn;

use super::Board;
use crate::kmd::{self, Line, Listing};
use crate::link::Link;
use crate::wire::{Op, Width};

/// Rows in a memory view.
pub const ROWS: usize = 13;

/// One row of the memory view.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Row {
    /// Row address.
    pub address: u32,
    /// Hexadecimal rendering of the bytes at this address.
    pub hex: String,
    /// Listing text for this address, comment-stripped.
    pub disassembly: String,
    /// Whether a breakpoint traps this address.
    pub breakpoint: bool,
}

impl Board {
    /// Streams a listing's data fields into board memory.
    pub fn load(&self, listing: &Listing) {
        let mut link = self.link.lock();
        for line in listing {
            let mut offset = 0;
            for field in 0..kmd::FIELDS {
                let size = u32::from(line.size[field]);
                if size > 0 && offset + size <= kmd::BYTES {
                    Self::mem_set(
                        &mut link,
                        line.address.wrapping_add(offset),
                        line.size[field],
                        line.data[field],
                    );
                }
                offset += size;
            }
        }
    }

    /// Writes one memory element.
    ///
    /// Doubleword elements never fit the line budget and are refused.
    fn mem_set(link: &mut Link, addr: u32, size: u8, value: u32) {
        let Some(width) = Width::of(size.into()) else {
            return;
        };
        if matches!(width, Width::Eight) {
            return;
        }
        link.write_byte(Op::MemSet.code() | width.code());
        link.write_word(4, addr);
        link.write_word(2, 1);
        link.write_bytes(&value.to_le_bytes()[..width.size()]);
    }

    /// Reads a [`ROWS`]-row view starting at (the word floor of) `start`.
    ///
    /// # Panics
    ///
    /// Cannot panic.
    #[must_use]
    pub fn view(&self, start: u32, listing: &Listing) -> Vec<Row> {
        let start = start & !3;
        let mut link = self.link.lock();

        // Fetch the raw window
        let mut dump = [0; ROWS * 4];
        link.write_byte(Op::MemGet.code());
        link.write_word(4, start);
        link.write_word(2, ROWS as u32);
        let count = link.read_bytes(&mut dump);
        if count < dump.len() {
            warn!("short memory read: {count} of {} bytes", dump.len());
        }

        // Fetch breakpoint flags
        let bpts = Self::breakpoints_with(&mut link);
        drop(link);

        // Position the listing cursor at the first data line at or above the
        // window, wrapping (at most once) to the listing's start
        let lines: &[Line] = listing;
        let mut wrapped = false;
        let mut src = lines
            .iter()
            .position(|line| line.has_data() && line.address >= start);
        if src.is_none() {
            wrapped = true;
            src = lines.iter().position(Line::has_data);
        }

        // Merge the dump against the listing, row by row
        let mut rows = Vec::with_capacity(ROWS);
        let mut addr = start;
        for _ in 0..ROWS {
            let mut row = Row {
                address: addr,
                hex: "00000000".to_string(),
                disassembly: "...".to_string(),
                breakpoint: bpts.contains(&addr),
            };
            let mut step = 4;
            if let Some(at) = src {
                let line = &lines[at];
                if line.address == addr {
                    // Render the line's bytes out of the dump, field by field
                    let mut hex = String::new();
                    let mut offset = addr.wrapping_sub(start);
                    for field in 0..kmd::FIELDS {
                        let size = u32::from(line.size[field]);
                        if size > 0 {
                            for idx in (0..size).rev() {
                                let byte = usize::try_from(offset.wrapping_add(idx))
                                    .ok()
                                    .and_then(|at| dump.get(at))
                                    .copied()
                                    .unwrap_or_default();
                                write!(hex, "{byte:02X}").unwrap();
                            }
                            for _ in 0..size {
                                hex.push(' ');
                            }
                        }
                        offset += size;
                    }
                    row.hex = hex;
                    row.disassembly = line.disassembly().to_string();
                    // A matched row advances by the line's loadable bytes
                    step = line.size.iter().copied().map(u32::from).sum();
                    src = advance(lines, at, &mut wrapped);
                } else {
                    // Step to the next line when near, else to word alignment
                    let mut diff = line.address.wrapping_sub(addr);
                    if diff == 0 {
                        diff = match lines.get(at + 1) {
                            Some(next) => next.address.wrapping_sub(addr),
                            None => 1000,
                        };
                    }
                    step = if diff < 4 { diff } else { 4 - (addr % 4) };
                }
            }
            rows.push(row);
            addr = addr.wrapping_add(step);
        }
        rows
    }
}

/// Advances the cursor to the next data line, wrapping once.
fn advance(lines: &[Line], at: usize, wrapped: &mut bool) -> Option<usize> {
    let mut next = at + 1;
    loop {
        if next >= lines.len() {
            if *wrapped {
                return None;
            }
            *wrapped = true;
            next = 0;
            continue;
        }
        if lines[next].has_data() {
            return Some(next);
        }
        next += 1;
    }
}
