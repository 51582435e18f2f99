#![warn(clippy::pedantic)]

use anyhow::Context;
use clap::Parser;
use log::trace;

use crate::cli::Cli;
use crate::err::{Exit, Result};

mod app;
mod cli;
mod err;
mod lang;

/// Application name.
pub const NAME: &str = "jetty";

fn main() -> Exit {
    // Parse args (usage errors must exit with code 1)
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return Exit::Usage;
        }
    };
    match run(args) {
        Ok(()) => Exit::Success,
        Err(err) => Exit::Failure(err),
    }
}

fn run(args: Cli) -> Result<()> {
    // Initialize logger
    setup::log().context("could not initialize logger")?;
    // Log previous steps
    trace!("{args:#?}");

    // Locate the toolchain next to this executable
    let tools = setup::tools()?;
    // Spawn the board
    let (session, link) = jetty::spawn::board(&tools.board).context("could not spawn board")?;
    // Prepare application
    let app = app::App::new(args, tools, session, link);
    // Run application
    app.run()?;

    // Terminate normally
    Ok(())
}

mod setup {
    use std::env;
    use std::path::PathBuf;

    use anyhow::{Context, Result};
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::filter::LevelFilter;

    /// Sibling binaries used by the host.
    #[derive(Debug)]
    pub struct Tools {
        /// Board emulator binary.
        pub board: PathBuf,
        /// Assembler binary.
        pub asm: PathBuf,
    }

    /// Installs the logger, filtered from the environment.
    pub fn log() -> Result<()> {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::builder()
                    .with_default_directive(LevelFilter::WARN.into())
                    .from_env()
                    .context("failed to parse log filter")?,
            )
            .with_writer(std::io::stderr)
            .init();
        Ok(())
    }

    /// Locates the board and assembler next to the host executable.
    pub fn tools() -> Result<Tools> {
        let exe = env::current_exe().context("could not find executable path")?;
        let dir = exe.parent().context("executable has no directory")?;
        Ok(Tools {
            board: dir.join("board"),
            asm: dir.join("asm"),
        })
    }
}
