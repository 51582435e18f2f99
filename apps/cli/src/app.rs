//! Interactive controller.
//!
//! The foreground thread owns the prompt; a detached relay thread polls the
//! board for terminal output and prints it as it arrives. Both share the
//! session's protocol mutex, so their exchanges never interleave on the
//! wire.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use jetty::kmd::Listing;
use jetty::spawn::{self, Session};
use jetty::{Board, Link};
use log::debug;

use crate::cli::Cli;
use crate::err::Result;
use crate::lang::{self, Command, Keyword};
use crate::setup::Tools;

/// Cadence of the terminal output relay.
const RELAY: Duration = Duration::from_millis(10);

/// Interactive board controller.
#[derive(Debug)]
pub struct App {
    /// Board protocol driver.
    board: Arc<Board>,
    /// Board child, reaped on drop.
    _session: Session,
    /// Currently loaded listing.
    listing: Listing,
    /// Source file under debug.
    source: PathBuf,
    /// Derived listing path.
    kmd: PathBuf,
    /// Sibling tool paths.
    tools: Tools,
    /// Last memory window shown.
    window: u32,
}

impl App {
    /// Constructs the controller around a spawned board.
    pub fn new(args: Cli, tools: Tools, session: Session, link: Link) -> Self {
        let kmd = args.source.with_extension("kmd");
        Self {
            board: Arc::new(Board::new(link)),
            _session: session,
            listing: Listing::default(),
            source: args.source,
            kmd,
            tools,
            window: 0,
        }
    }

    /// Runs the controller until quit or end of input.
    pub fn run(mut self) -> Result<()> {
        // Start the terminal output relay
        let alive = Arc::new(AtomicBool::new(true));
        let relay = thread::spawn({
            let board = Arc::clone(&self.board);
            let alive = Arc::clone(&alive);
            move || {
                while alive.load(Ordering::Relaxed) {
                    thread::sleep(RELAY);
                    let out = board.pull();
                    if !out.is_empty() {
                        print!("{out}");
                        let _ = io::stdout().flush();
                    }
                }
            }
        });

        // Assemble and load before the first prompt
        if let Err(err) = self.load() {
            advise::error!("{err:#}");
        }

        // Drive the prompt until quit
        let result = self.prompt();

        // Stop the relay; the session drop then reaps the board
        alive.store(false, Ordering::Relaxed);
        let _ = relay.join();
        result
    }

    /// Reads and executes prompt lines until quit or end of input.
    fn prompt(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut line = String::new();
        loop {
            // Present the prompt
            print!("({})> ", self.board.status());
            io::stdout().flush().map_err(anyhow::Error::from)?;

            // Read input
            line.clear();
            if stdin
                .lock()
                .read_line(&mut line)
                .map_err(anyhow::Error::from)?
                == 0
            {
                // End of input quits
                break;
            }

            // Parse input
            let cmd = match lang::parse(line.trim()) {
                Ok(Some(cmd)) => cmd,
                Ok(None) => continue,
                Err(err) => {
                    advise::error!("{err}");
                    continue;
                }
            };
            debug!("parsed command: `{cmd:?}`");

            // Execute the command
            match self.exec(cmd) {
                Ok(true) => (),
                Ok(false) => break,
                Err(err) => advise::error!("{err:#}"),
            }
        }
        Ok(())
    }

    /// Executes a command, returning `false` to quit.
    fn exec(&mut self, cmd: Command) -> anyhow::Result<bool> {
        match cmd {
            Command::Break(addr) => self.r#break(addr),
            Command::Continue => self.board.resume(),
            Command::Help(topic) => Self::help(topic),
            Command::Info => self.info(),
            Command::Load => self.load()?,
            Command::Mem(addr) => self.mem(addr),
            Command::Quit => return Ok(false),
            Command::Regs => self.regs(),
            Command::Reset => self.board.reset(),
            Command::Send(text) => self.send(&text),
            Command::Start => self.board.start(0),
            Command::Status => self.status(),
            Command::Step(count) => self.board.start(count),
            Command::Stop => self.board.pause(),
        }
        Ok(true)
    }

    /// Toggles the breakpoint at an address.
    fn r#break(&self, addr: u32) {
        if self.board.toggle(addr) {
            println!("breakpoint set at {addr:#010x}");
        } else {
            println!("breakpoint cleared at {addr:#010x} (or table full)");
        }
    }

    /// Lists live breakpoints.
    fn info(&self) {
        let bpts = self.board.breakpoints();
        if bpts.is_empty() {
            println!("no breakpoints");
        }
        for (point, addr) in bpts.iter().enumerate() {
            println!("breakpoint {point} @ {addr:#010x}");
        }
    }

    /// Prints the register file.
    fn regs(&self) {
        for (reg, value) in self.board.registers().iter().enumerate() {
            match reg {
                15 => println!("pc : {value}"),
                _ => println!("r{reg:<2}: {value}"),
            }
        }
    }

    /// Renders the memory view.
    fn mem(&mut self, addr: Option<u32>) {
        self.window = addr.unwrap_or(self.window);
        for row in self.board.view(self.window, &self.listing) {
            let mark = if row.breakpoint { '*' } else { ' ' };
            println!(
                "{mark} {address:08X}  {hex:<13} {disassembly}",
                address = row.address,
                hex = row.hex,
                disassembly = row.disassembly,
            );
        }
    }

    /// Prints the status word and step counters.
    fn status(&self) {
        let probe = self.board.probe();
        println!("status: {}", probe.status);
        println!("steps remaining: {}", probe.remaining);
        println!("steps since reset: {}", probe.elapsed);
    }

    /// Relays a line of terminal input to the board.
    fn send(&self, text: &str) {
        for code in text.chars().map(u32::from).chain([u32::from('\n')]) {
            if !self.board.push(code) {
                advise::warn!("rejected key code {code:#x}");
            }
        }
    }

    /// Assembles the source and loads the fresh listing.
    fn load(&mut self) -> anyhow::Result<()> {
        // Flush any previous listing before the attempt
        self.listing = Listing::default();

        // Run the assembler, surfacing its transcript
        let transcript = spawn::assemble(&self.tools.asm, &self.source, &self.kmd)
            .with_context(|| format!("could not assemble `{}`", self.source.display()))?;
        if !transcript.trim().is_empty() {
            debug!("assembler: {}", transcript.trim());
        }

        // Parse the listing and stream it into board memory
        self.listing = Listing::load(&self.kmd)
            .with_context(|| format!("could not read `{}`", self.kmd.display()))?;
        self.board.load(&self.listing);
        println!(
            "loaded {count} lines from `{path}`",
            count = self.listing.len(),
            path = self.kmd.display(),
        );
        Ok(())
    }

    /// Prints help for a topic.
    fn help(topic: Option<Keyword>) {
        println!("{}", topic.unwrap_or(Keyword::All));
    }
}
