// Licensed under the Apache-2.0 license

//! Textual address grammar.
//!
//! Memory-map data carries addresses in three forms: grouped hexadecimal
//! with internal spaces (`"0x4000 0000"`), plain hexadecimal (`"0x40000000"`),
//! and a register offset form (`"Offset: 0x0C"`) that is only meaningful
//! relative to an enclosing base address. Range ends may additionally be a
//! width marker (`"16-bit"` / `"32-bit"`) instead of an absolute address.
//!
//! Parsing is pure and total over [`AddrError`]; nothing in this module
//! panics on malformed input.

use thiserror::Error;
use winnow::ascii::space0;
use winnow::combinator::alt;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take_while;

use crate::node::RegisterWidth;

/// Address text that failed to normalize.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AddrError {
    #[error("malformed address text {text:?}")]
    Malformed { text: String },
    #[error("offset form {text:?} used without an enclosing base address")]
    MissingBase { text: String },
    #[error("address {value:#x} exceeds the {bits}-bit address space")]
    OutOfRange { value: u64, bits: u32 },
    #[error("range start {start:#x} exceeds end {end:#x}")]
    Inverted { start: u64, end: u64 },
}

/// An inclusive address interval, `start <= end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AddressRange {
    pub start: u64,
    pub end: u64,
}

impl AddressRange {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end);
        AddressRange { start, end }
    }

    pub fn contains(&self, address: u64) -> bool {
        self.start <= address && address <= self.end
    }

    /// Whether the other range lies wholly inside this one, shared boundary
    /// points included.
    pub fn encloses(&self, other: &AddressRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Two inclusive ranges overlap iff `max(starts) <= min(ends)`.
    pub fn overlaps(&self, other: &AddressRange) -> bool {
        self.start.max(other.start) <= self.end.min(other.end)
    }
}

impl std::fmt::Display for AddressRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:#010x}, {:#010x}]", self.start, self.end)
    }
}

/// Parsed form of a node's `start` text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartText {
    Absolute(u64),
    /// Byte offset from the enclosing node's start address.
    Offset(u64),
}

/// Parsed form of a node's `end` text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndText {
    Absolute(u64),
    /// Width marker; the end address is derived from the resolved start.
    Width(RegisterWidth),
}

/// A range resolved from textual start/end forms. `width` is populated when
/// the end text was a width marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedRange {
    pub range: AddressRange,
    pub width: Option<RegisterWidth>,
}

/// The addressable bound against which parsed values are checked.
///
/// Defaults to a 32-bit space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressSpace {
    bits: u32,
}

impl Default for AddressSpace {
    fn default() -> Self {
        AddressSpace { bits: 32 }
    }
}

impl AddressSpace {
    pub fn new(bits: u32) -> Self {
        debug_assert!((1..=64).contains(&bits));
        AddressSpace {
            bits: bits.clamp(1, 64),
        }
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Highest address representable in this space.
    pub fn max_address(&self) -> u64 {
        if self.bits == 64 {
            u64::MAX
        } else {
            (1u64 << self.bits) - 1
        }
    }

    /// Normalize an absolute address text into an integer, rejecting values
    /// beyond the space bound. Offset forms are not accepted here.
    pub fn parse_address(&self, text: &str) -> Result<u64, AddrError> {
        let value = absolute
            .parse(text.trim())
            .map_err(|_| AddrError::Malformed {
                text: text.to_string(),
            })?;
        self.check_bound(value)
    }

    /// Parse a node's `start` text: absolute address or offset form.
    pub fn parse_start(&self, text: &str) -> Result<StartText, AddrError> {
        let form = alt((offset_form.map(StartText::Offset), absolute.map(StartText::Absolute)))
            .parse(text.trim())
            .map_err(|_| AddrError::Malformed {
                text: text.to_string(),
            })?;
        if let StartText::Absolute(value) = form {
            self.check_bound(value)?;
        }
        Ok(form)
    }

    /// Parse a node's `end` text: absolute address or width marker.
    pub fn parse_end(&self, text: &str) -> Result<EndText, AddrError> {
        let form = alt((width_marker.map(EndText::Width), absolute.map(EndText::Absolute)))
            .parse(text.trim())
            .map_err(|_| AddrError::Malformed {
                text: text.to_string(),
            })?;
        if let EndText::Absolute(value) = form {
            self.check_bound(value)?;
        }
        Ok(form)
    }

    /// Resolve a `(start, end)` text pair into an absolute range.
    ///
    /// `base` is the enclosing node's start address; it is required for the
    /// offset form and for width-marker ends combined with an offset start.
    /// Width-marker ends resolve as `start + width/8 - 1`.
    pub fn resolve_range(
        &self,
        start: &str,
        end: &str,
        base: Option<u64>,
    ) -> Result<ResolvedRange, AddrError> {
        let abs_start: u64 = match self.parse_start(start)? {
            StartText::Absolute(value) => value,
            StartText::Offset(offset) => {
                let base = base.ok_or_else(|| AddrError::MissingBase {
                    text: start.to_string(),
                })?;
                self.checked_sum(base, offset)?
            }
        };
        let (abs_end, width) = match self.parse_end(end)? {
            EndText::Absolute(value) => (value, None),
            EndText::Width(width) => (self.checked_sum(abs_start, width.bytes() - 1)?, Some(width)),
        };
        if abs_start > abs_end {
            return Err(AddrError::Inverted {
                start: abs_start,
                end: abs_end,
            });
        }
        self.check_bound(abs_end)?;
        Ok(ResolvedRange {
            range: AddressRange::new(abs_start, abs_end),
            width,
        })
    }

    fn check_bound(&self, value: u64) -> Result<u64, AddrError> {
        if value > self.max_address() {
            return Err(AddrError::OutOfRange {
                value,
                bits: self.bits,
            });
        }
        Ok(value)
    }

    fn checked_sum(&self, base: u64, offset: u64) -> Result<u64, AddrError> {
        let sum = base as u128 + offset as u128;
        if sum > self.max_address() as u128 {
            return Err(AddrError::OutOfRange {
                value: sum.min(u64::MAX as u128) as u64,
                bits: self.bits,
            });
        }
        Ok(sum as u64)
    }
}

/// Parse a bare hex literal such as a reset value (`"0x4444 4444"`).
/// No address-space bound is applied; the caller checks the value against
/// the register width.
pub fn parse_hex_literal(text: &str) -> Result<u64, AddrError> {
    absolute.parse(text.trim()).map_err(|_| AddrError::Malformed {
        text: text.to_string(),
    })
}

/// A run of hex digits, internal spaces allowed and non-semantic.
fn hex_run(input: &mut &str) -> ModalResult<u64> {
    let run = take_while(1.., |c: char| c.is_ascii_hexdigit() || c == ' ').parse_next(input)?;
    let digits: String = run.chars().filter(|c| *c != ' ').collect();
    if digits.is_empty() || digits.len() > 16 {
        return Err(ErrMode::Cut(ContextError::new()));
    }
    u64::from_str_radix(&digits, 16).map_err(|_| ErrMode::Cut(ContextError::new()))
}

fn absolute(input: &mut &str) -> ModalResult<u64> {
    let _ = alt(("0x", "0X")).parse_next(input)?;
    hex_run(input)
}

fn offset_form(input: &mut &str) -> ModalResult<u64> {
    let _ = "Offset:".parse_next(input)?;
    let _ = space0.parse_next(input)?;
    absolute(input)
}

fn width_marker(input: &mut &str) -> ModalResult<RegisterWidth> {
    alt((
        "16-bit".value(RegisterWidth::Bits16),
        "32-bit".value(RegisterWidth::Bits32),
    ))
    .parse_next(input)
}
