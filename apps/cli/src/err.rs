//! Exit handling.

use std::error::Error as StdError;
use std::fmt::Display;
use std::process::{ExitCode, Termination};

use advise::Render;
use clap::builder::styling::{AnsiColor, Style};
use thiserror::Error;

/// A convenient type alias for [`Result`](std::result::Result).
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Any error that escapes the application's main loop.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Application error.
    #[error(transparent)]
    App(#[from] anyhow::Error),
    /// Supervisor error.
    #[error(transparent)]
    Spawn(#[from] jetty::spawn::Error),
}

impl Error {
    /// Reports the error to the user, outermost message first.
    ///
    /// Each underlying cause follows on its own labelled line, down to the
    /// root.
    fn report(&self) {
        advise::error!("{}", format!("{self}").trim_end());
        let mut cause = self.source();
        while let Some(err) = cause {
            advise::advise!(Caused, "{}", format!("{err}").trim_end());
            cause = err.source();
        }
    }
}

impl From<Error> for ExitCode {
    fn from(err: Error) -> Self {
        match err {
            Error::App(_) => ExitCode::FAILURE,
            Error::Spawn(_) => sysexits::ExitCode::Unavailable.into(),
        }
    }
}

/// How the process finishes.
///
/// Returned from `main` so that the [`Termination`] impl settles the exit
/// code once any error has been reported.
#[derive(Debug)]
pub enum Exit {
    /// Clean exit.
    Success,
    /// Rejected command line; exits with code 1.
    Usage,
    /// Failed with an [`Error`], reported before exiting non-zero.
    Failure(Error),
}

impl<E: Into<Error>> From<E> for Exit {
    fn from(err: E) -> Self {
        Self::Failure(err.into())
    }
}

impl Termination for Exit {
    fn report(self) -> ExitCode {
        match self {
            Exit::Success => ExitCode::SUCCESS,
            Exit::Usage => ExitCode::FAILURE,
            Exit::Failure(err) => {
                err.report();
                err.into()
            }
        }
    }
}

/// Label for the causes beneath a reported error.
#[derive(Debug)]
struct Caused;

impl Render for Caused {
    fn style(&self) -> Style {
        AnsiColor::Red.on_default()
    }

    fn label(&self) -> impl Display {
        "caused by"
    }
}
