//! Board wire protocol.
//!
//! Every request is one opcode byte followed by a payload whose shape is
//! fixed by the opcode; replies, where present, are fixed-shape or
//! length-prefixed. The protocol is stateless on the wire: the board never
//! echoes opcodes back.

use std::fmt::Display;

/// Request opcodes understood by the board.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum Op {
    /// Begin execution for a 32-bit step count (zero runs freely).
    Start = 0xB0,
    /// Query the status word and step counters.
    Probe = 0x20,
    /// Halt execution.
    Stop = 0x21,
    /// Resume execution.
    Continue = 0x23,
    /// Reset the board.
    Reset = 0x04,
    /// Write a chunk to a virtual terminal.
    TtyPut = 0x12,
    /// Read a chunk from a virtual terminal.
    TtyGet = 0x13,
    /// Define a breakpoint slot.
    BpWrite = 0x30,
    /// Read back a breakpoint slot.
    BpRead = 0x31,
    /// Update the breakpoint bitmaps.
    BpSet = 0x32,
    /// Query the breakpoint bitmaps.
    BpGet = 0x33,
    /// Read back registers.
    RegGet = 0x5A,
    /// Write registers (unused by this host).
    RegSet = 0x52,
    /// Read raw memory.
    MemGet = 0x4A,
    /// Write memory; a [`Width`] code is folded into the low nibble.
    MemSet = 0x40,
}

impl Op {
    /// Returns the opcode's wire byte.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Element width code for memory writes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Width {
    /// Single byte.
    One,
    /// Halfword.
    Two,
    /// Word.
    Four,
    /// Doubleword.
    Eight,
}

impl Width {
    /// Returns the width code, as OR-ed into [`Op::MemSet`].
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::One => 0,
            Self::Two => 1,
            Self::Four => 2,
            Self::Eight => 3,
        }
    }

    /// Returns the element size in bytes.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Four => 4,
            Self::Eight => 8,
        }
    }

    /// Looks up the width for an element size in bytes.
    #[must_use]
    pub const fn of(size: usize) -> Option<Self> {
        match size {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            4 => Some(Self::Four),
            8 => Some(Self::Eight),
            _ => None,
        }
    }
}

/// Board status word.
///
/// Decoded from the first reply byte of [`Op::Probe`]. [`Broken`]
/// (`Status::Broken`) is also synthesised host-side when the board stops
/// answering.
///
/// [`Broken`]: Status::Broken
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Status {
    /// Halted and ready.
    #[default]
    Normal,
    /// Transferring.
    Busy,
    /// Halted at a breakpoint.
    Breakpoint,
    /// Halted by a memory fault.
    Fault,
    /// Program ran to completion.
    Finished,
    /// Executing.
    Running,
    /// Executing a service call.
    Service,
    /// Single-stepping.
    Stepping,
    /// Not responding.
    Broken,
}

impl Status {
    /// Returns the status's wire byte.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Normal => 0x00,
            Self::Busy => 0x01,
            Self::Breakpoint => 0x41,
            Self::Fault => 0x43,
            Self::Finished => 0x44,
            Self::Running => 0x80,
            Self::Service => 0x81,
            Self::Stepping => 0x82,
            Self::Broken => 0x30,
        }
    }

    /// Whether the board will accept a start or continue command.
    #[must_use]
    pub const fn halted(self) -> bool {
        matches!(self, Self::Normal | Self::Breakpoint)
    }
}

impl From<u8> for Status {
    /// Decodes a status byte, coercing anything unrecognised to
    /// [`Status::Normal`].
    fn from(byte: u8) -> Self {
        match byte {
            0x00 => Self::Normal,
            0x01 => Self::Busy,
            0x41 => Self::Breakpoint,
            0x43 => Self::Fault,
            0x44 => Self::Finished,
            0x80 => Self::Running,
            0x81 => Self::Service,
            0x82 => Self::Stepping,
            0x30 => Self::Broken,
            _ => Self::Normal,
        }
    }
}

#[rustfmt::skip]
impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Normal     => "normal",
                Self::Busy       => "busy",
                Self::Breakpoint => "breakpoint",
                Self::Fault      => "memory fault",
                Self::Finished   => "finished",
                Self::Running    => "running",
                Self::Service    => "running (svc)",
                Self::Stepping   => "stepping",
                Self::Broken     => "broken",
            }
        )
    }
}
