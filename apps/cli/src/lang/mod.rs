//! Prompt command language.

use displaydoc::Display;

mod parse;

pub use self::parse::{Error, parse};

/// A parsed prompt command.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Set or clear a breakpoint.
    Break(u32),
    /// Resume execution.
    Continue,
    /// Print help.
    Help(Option<Keyword>),
    /// List breakpoints.
    Info,
    /// Assemble and load the source file.
    Load,
    /// Render the memory view.
    Mem(Option<u32>),
    /// Exit the program.
    Quit,
    /// Print registers.
    Regs,
    /// Reset the board.
    Reset,
    /// Send text to the board's terminal.
    Send(String),
    /// Begin free-running execution.
    Start,
    /// Print the board status and step counters.
    Status,
    /// Execute a bounded number of steps.
    Step(u32),
    /// Halt execution.
    Stop,
}

/// Help topics.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Keyword {
    /**
     * Board debugger.
     *
     * COMMANDS:
     * * `break`,     `br`,    `b`: Set or clear a breakpoint.
     * * `continue`,  `cont`,  `c`: Resume execution.
     * * `help`,               `h`: Print help.
     * * `info`,               `i`: List breakpoints.
     * * `load`,      `ld`,    `l`: Assemble and load the source file.
     * * `memory`,    `mem`,   `m`: Render the memory view.
     * * `quit`,      `exit`,  `q`: Exit the program.
     * * `registers`, `regs`,  `r`: Print registers.
     * * `reset`,     `res`      : Reset the board.
     * * `send`,      `tx`       : Send text to the board's terminal.
     * * `start`,     `go`       : Begin free-running execution.
     * * `status`,    `st`       : Print the board status.
     * * `step`,               `s`: Execute a bounded number of steps.
     * * `stop`,      `pause`, `p`: Halt execution.
     *
     * Use `help COMMAND` for more information about a command.
     */
    All,
    /**
     * `break <ADDRESS>`
     *
     * Set a breakpoint at the given hexadecimal address, or clear the one
     * already there. The board offers at most 32 breakpoint slots; setting
     * fails silently once every slot is taken.
     *
     * Aliases: `br`, `b`
     */
    Break,
    /**
     * `continue`
     *
     * Resume execution after a halt. Ignored unless the board is sitting at
     * a breakpoint or otherwise halted.
     *
     * Aliases: `cont`, `c`
     */
    Continue,
    /**
     * `help [COMMAND]`
     *
     * Print help for the given command.
     *
     * Aliases: `h`
     */
    Help,
    /**
     * `info`
     *
     * List every live breakpoint with its slot index and address.
     *
     * Aliases: `i`
     */
    Info,
    /**
     * `load`
     *
     * Assemble the source file and load the fresh listing into board
     * memory. Run after editing the source to pick up changes; the previous
     * listing is discarded first.
     *
     * Aliases: `ld`, `l`
     */
    Load,
    /**
     * `memory [ADDRESS]`
     *
     * Render thirteen rows of board memory starting at the given
     * hexadecimal address (snapped down to a word boundary), annotated with
     * the loaded listing's source text. Without an address, the previous
     * window is shown again.
     *
     * Aliases: `mem`, `m`
     */
    Mem,
    /**
     * `quit`
     *
     * Exit, terminating the board.
     *
     * Aliases: `exit`, `q`
     */
    Quit,
    /**
     * `registers`
     *
     * Print all sixteen registers, r0 through r14 plus the program counter.
     *
     * Aliases: `regs`, `r`
     */
    Regs,
    /**
     * `reset`
     *
     * Reset the board. Honoured in any state.
     *
     * Aliases: `res`
     */
    Reset,
    /**
     * `send <TEXT>`
     *
     * Send the given text, followed by a newline, to the program running on
     * the board as terminal input. Only printable characters are relayed.
     *
     * Aliases: `tx`
     */
    Send,
    /**
     * `start`
     *
     * Begin execution, running until a breakpoint or halt. Ignored unless
     * the board is halted.
     *
     * Aliases: `go`
     */
    Start,
    /**
     * `status`
     *
     * Print the board's status word along with the steps remaining in the
     * current run and the steps executed since the last reset.
     *
     * Aliases: `st`
     */
    Status,
    /**
     * `step [COUNT]`
     *
     * Execute one (or COUNT) instructions, then halt. Ignored unless the
     * board is halted.
     *
     * Aliases: `s`
     */
    Step,
    /**
     * `stop`
     *
     * Halt execution. Honoured in any state.
     *
     * Aliases: `pause`, `p`
     */
    Stop,
}
