//! Prompt line parser.

#![allow(clippy::result_large_err)]

use std::num::ParseIntError;

use pest::Parser as _;
use pest::iterators::Pair;
use pest_derive::Parser;
use thiserror::Error;

use super::{Command, Keyword};

/// A convenient type alias for [`Result`](std::result::Result).
type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Parser)]
#[grammar = "lang/parse.pest"]
struct Language;

/// Parses a single prompt line.
///
/// Blank lines parse to `None`.
///
/// # Errors
///
/// Errors on malformed commands, numbers, or help topics.
pub fn parse(src: &str) -> Result<Option<Command>> {
    // Parse the input string
    let mut pairs = Language::parse(Rule::Input, src)?;
    // Extract the top-level pair
    let Some(top) = pairs.next() else {
        return Ok(None);
    };

    // Match a command rule
    let cmd = match top.as_rule() {
        Rule::Break => Command::Break(addr(&find(top, Rule::Addr))?),
        Rule::Continue => Command::Continue,
        Rule::Help => Command::Help(match try_find(top, Rule::Topic) {
            Some(pair) => Some(topic(&pair)?),
            None => None,
        }),
        Rule::Info => Command::Info,
        Rule::Load => Command::Load,
        Rule::Mem => Command::Mem(match try_find(top, Rule::Addr) {
            Some(pair) => Some(addr(&pair)?),
            None => None,
        }),
        Rule::Quit => Command::Quit,
        Rule::Regs => Command::Regs,
        Rule::Reset => Command::Reset,
        Rule::Send => Command::Send(find(top, Rule::Text).as_str().to_string()),
        Rule::Start => Command::Start,
        Rule::Status => Command::Status,
        Rule::Step => match try_find(top, Rule::UInt) {
            Some(pair) => Command::Step(pair.as_str().parse()?),
            None => Command::Step(1),
        },
        Rule::Stop => Command::Stop,
        Rule::EOI => return Ok(None),
        rule => unreachable!("invalid rule: {rule:?}"),
    };

    Ok(Some(cmd))
}

/// Extracts a required inner operand.
fn find(pair: Pair<'_, Rule>, rule: Rule) -> Pair<'_, Rule> {
    try_find(pair, rule).expect("missing inner rule")
}

/// Extracts an optional inner operand.
fn try_find(pair: Pair<'_, Rule>, rule: Rule) -> Option<Pair<'_, Rule>> {
    pair.into_inner().find(|inner| inner.as_rule() == rule)
}

/// Parses a hexadecimal address, with or without an `0x` prefix.
fn addr(pair: &Pair<'_, Rule>) -> Result<u32> {
    let digits = pair.as_str();
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);
    u32::from_str_radix(digits, 16).map_err(Into::into)
}

/// Resolves a help topic to its keyword.
fn topic(pair: &Pair<'_, Rule>) -> Result<Keyword> {
    let word = pair.as_str().to_lowercase();
    match word.as_str() {
        "all" => Ok(Keyword::All),
        "break" | "br" | "b" => Ok(Keyword::Break),
        "continue" | "cont" | "c" => Ok(Keyword::Continue),
        "help" | "h" => Ok(Keyword::Help),
        "info" | "i" => Ok(Keyword::Info),
        "load" | "ld" | "l" => Ok(Keyword::Load),
        "memory" | "mem" | "m" => Ok(Keyword::Mem),
        "quit" | "exit" | "q" => Ok(Keyword::Quit),
        "registers" | "regs" | "r" => Ok(Keyword::Regs),
        "reset" | "res" => Ok(Keyword::Reset),
        "send" | "tx" => Ok(Keyword::Send),
        "start" | "go" => Ok(Keyword::Start),
        "status" | "st" => Ok(Keyword::Status),
        "step" | "s" => Ok(Keyword::Step),
        "stop" | "pause" | "p" => Ok(Keyword::Stop),
        _ => Err(Error::Topic(word)),
    }
}

/// An error caused by parsing a prompt line.
#[derive(Debug, Error)]
pub enum Error {
    /// Unknown help topic.
    #[error("unknown topic: {0:?}")]
    Topic(String),
    /// Malformed number.
    #[error(transparent)]
    ParseInt(#[from] ParseIntError),
    /// Malformed command.
    #[error(transparent)]
    Pest(#[from] pest::error::Error<Rule>),
}
