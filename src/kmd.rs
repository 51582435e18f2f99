//! Listing file parser.
//!
//! A listing (`.kmd`) is the assembler's line-oriented record of where each
//! encoded instruction or datum landed in memory, together with the source
//! text that produced it. Each code record carries a hexadecimal address, up
//! to four hexadecimal data fields, and an optional `;`-introduced source
//! line. Records prefixed with `:` describe symbols and are discarded here.
//!
//! Parsing yields a [`Listing`]: lines sorted by ascending address, stable
//! among equal addresses, which the [`Board`](crate::Board) walks to load
//! memory and to annotate raw dumps with source text.

use std::fs;
use std::io;
use std::ops::Deref;
use std::path::Path;
use std::slice;

use log::warn;
use thiserror::Error;

/// Data fields per listing line.
pub const FIELDS: usize = 4;
/// Loadable bytes per listing line.
pub const BYTES: u32 = 4;
/// Source text clip, in bytes.
pub const TEXT: usize = 100;

/// A convenient type alias for [`Result`](std::result::Result).
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// One line of a listing.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Line {
    /// Memory address of the line.
    pub address: u32,
    /// Byte width of each data field (zero when absent or clipped).
    pub size: [u8; FIELDS],
    /// Raw value of each data field.
    pub data: [u32; FIELDS],
    /// Source text, as imported.
    pub text: String,
}

impl Line {
    /// Whether any data field survives with a nonzero width.
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.size.iter().any(|&size| size > 0)
    }

    /// Source text with any trailing `;` comment removed.
    #[must_use]
    pub fn disassembly(&self) -> &str {
        match self.text.find(';') {
            Some(at) => &self.text[..at],
            None => &self.text,
        }
    }
}

/// A parsed listing.
///
/// Lines are kept sorted by ascending address; lines sharing an address stay
/// in the order they were read. Rebuilt wholesale on every load.
#[derive(Clone, Debug, Default)]
pub struct Listing(Vec<Line>);

impl Listing {
    /// Reads and parses the listing file at `path`.
    ///
    /// # Errors
    ///
    /// Errors when the file cannot be read; unparseable records are skipped
    /// with a diagnostic instead.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read(path)?;
        Ok(Self::parse(&String::from_utf8_lossy(&text)))
    }

    /// Parses listing text.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut listing = Self::default();
        // Predicted address for records that omit their own
        let mut predicted = None;
        for record in text.lines() {
            // Symbol records are discarded and forget the prediction
            if record.starts_with(':') {
                predicted = None;
                continue;
            }
            if let Some(line) = Line::parse(record, &mut predicted) {
                listing.insert(line);
            }
        }
        listing
    }

    /// Places a line after every earlier line of lesser or equal address.
    fn insert(&mut self, line: Line) {
        let at = self.0.partition_point(|it| it.address <= line.address);
        self.0.insert(at, line);
    }

    /// Returns an iterator over the listing's lines.
    pub fn iter(&self) -> slice::Iter<'_, Line> {
        self.0.iter()
    }
}

impl Deref for Listing {
    type Target = [Line];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a> IntoIterator for &'a Listing {
    type Item = &'a Line;

    type IntoIter = slice::Iter<'a, Line>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Line {
    /// Parses one code record.
    ///
    /// Returns `None` for records carrying neither an address of their own
    /// nor a predicted one.
    fn parse(record: &str, predicted: &mut Option<u32>) -> Option<Self> {
        let mut scan = Scanner::new(record);

        let mut size = [0; FIELDS];
        let mut data = [0; FIELDS];

        // Address, either explicit or predicted from the previous record
        let address = match scan.hex() {
            (0, _) => (*predicted)?,
            (_, address) => {
                // Skip the separator trailing the address
                if scan.peek() == Some(b':') {
                    scan.bump();
                }
                // Data fields, up to the first empty one
                let mut total = 0;
                for field in 0..FIELDS {
                    let (width, value) = scan.hex();
                    if width == 0 {
                        break;
                    }
                    size[field] = width;
                    data[field] = value;
                    total += u32::from(width);
                }
                *predicted = Some(address.wrapping_add(total));
                address
            }
        };

        // Source text follows a `;`, clipped to length
        let text = scan.text();

        // Clip stored sizes once the line exceeds its loadable byte budget
        let total = size.iter().copied().map(u32::from).sum::<u32>();
        if total > BYTES {
            let mut seen = 0;
            for width in &mut size {
                seen += u32::from(*width);
                if seen > BYTES {
                    *width = 0;
                }
            }
            warn!("record at {address:#010x} carries {total} bytes; oversize fields not loaded");
        }

        Some(Self {
            address,
            size,
            data,
            text,
        })
    }
}

/// Byte scanner over a single record.
#[derive(Debug)]
struct Scanner<'a> {
    text: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(record: &'a str) -> Self {
        Self {
            text: record.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.text.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Lexes a hexadecimal number as `(width, value)`.
    ///
    /// Skips blanks, then consumes the maximal run of hex digits. The width
    /// is the digit count rounded up to whole bytes, then to a power of two,
    /// clipped at 4; a zero-digit run reports width 0. Values accumulate 4
    /// bits per digit, wrapping beyond 32 bits.
    fn hex(&mut self) -> (u8, u32) {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.bump();
        }
        let mut digits = 0u32;
        let mut value = 0u32;
        while let Some(digit) = self.peek().map(char::from).and_then(|c| c.to_digit(16)) {
            value = value.wrapping_shl(4) | digit;
            digits += 1;
            self.bump();
        }
        let width = match digits.div_ceil(2) {
            0 => 0,
            1 => 1,
            2 => 2,
            _ => 4,
        };
        (width, value)
    }

    /// Extracts the `;`-introduced source text, clipped to [`TEXT`] bytes.
    ///
    /// Consumes the remainder of the record; absent a `;`, the text is
    /// empty.
    fn text(&mut self) -> String {
        while !matches!(self.peek(), Some(b';') | None) {
            self.bump();
        }
        if self.bump().is_none() {
            return String::new();
        }
        // One formatting space may pad the separator
        if self.peek() == Some(b' ') {
            self.bump();
        }
        let rest = &self.text[self.pos..];
        let clip = rest.len().min(TEXT);
        String::from_utf8_lossy(&rest[..clip]).into_owned()
    }
}

/// An error caused by loading a listing.
#[derive(Debug, Error)]
pub enum Error {
    /// Listing file could not be read.
    #[error("failed to read listing")]
    Read(#[from] io::Error),
}
