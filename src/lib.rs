//! # Jetty
//!
//! Host-side client for an ARM board emulator driven over a pair of byte
//! pipes.
//!
//! The [board](crate::spawn) runs as a child process whose standard streams
//! carry a small binary [protocol](crate::wire). On top of that sit the
//! [listing parser](crate::kmd) and the [`Board`] session object, which
//! loads program images, controls execution, manages the board's breakpoint
//! table, reads back registers and memory, and relays the board's virtual
//! terminal.
//!
//! # Examples
//!
//! ```no_run
//! use std::path::Path;
//!
//! use jetty::{Board, Listing};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Spawn the board emulator
//! let (session, link) = jetty::spawn::board(Path::new("board"))?;
//! let board = Board::new(link);
//!
//! // Load a compiled listing into board memory
//! let listing = Listing::load(Path::new("demo.kmd"))?;
//! board.load(&listing);
//!
//! // Run until a breakpoint or halt
//! board.start(0);
//! while !board.status().halted() {
//!     print!("{}", board.pull());
//! }
//! # drop(session);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]

pub mod board;
pub mod kmd;
pub mod link;
pub mod spawn;
pub mod wire;

pub use self::board::{Board, Probe, Row};
pub use self::kmd::{Line, Listing};
pub use self::link::Link;
pub use self::spawn::Session;
pub use self::wire::Status;
