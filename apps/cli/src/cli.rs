//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, ValueHint};

/// Debug an assembly program on the board emulator.
///
/// Spawns the board, assembles the given source file, loads the resulting
/// listing into board memory, and presents an interactive prompt for
/// controlling execution. Terminal output from the emulated program is
/// relayed to stdout as it arrives.
#[derive(Debug, Parser)]
#[clap(name = crate::NAME, version, about, long_about)]
pub struct Cli {
    /// Assembly source file.
    ///
    /// The compiled listing is produced next to it, with its extension
    /// replaced by `.kmd`.
    #[clap(value_name = "SOURCE")]
    #[clap(value_hint = ValueHint::FilePath)]
    pub source: PathBuf,
}
