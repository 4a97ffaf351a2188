// Licensed under the Apache-2.0 license

//! Raw input records for a chip's memory-map description.
//!
//! These mirror the on-disk shape of the data: addresses are still text,
//! the node kind is optional, and register-only attributes sit alongside
//! the common ones. The engine's builder turns this loose shape into a
//! closed, validated tree. Presentation-only keys (`color`, `heightWeight`,
//! `longDescription`, `features`) are ignored during deserialization.

use serde::Deserialize;

/// Declared kind of a raw node.
///
/// Input data frequently omits the kind; the builder infers `register` for
/// offset-form nodes and `region` otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawKind {
    Block,
    Region,
    Peripheral,
    Reserved,
    Register,
}

/// Declared register width in bits. Only 16- and 32-bit registers exist in
/// this address space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u16")]
pub enum RegisterWidth {
    Bits16,
    Bits32,
}

impl TryFrom<u16> for RegisterWidth {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            16 => Ok(RegisterWidth::Bits16),
            32 => Ok(RegisterWidth::Bits32),
            other => Err(format!("unsupported register width {}", other)),
        }
    }
}

impl RegisterWidth {
    pub fn bits(self) -> u32 {
        match self {
            RegisterWidth::Bits16 => 16,
            RegisterWidth::Bits32 => 32,
        }
    }

    pub fn bytes(self) -> u64 {
        (self.bits() / 8) as u64
    }

    /// Mask covering every valid bit position of the register.
    pub fn mask(self) -> u64 {
        (1u64 << self.bits()) - 1
    }
}

impl std::fmt::Display for RegisterWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// Software access policy of a bit-field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum Access {
    /// Read-only.
    #[serde(rename = "r")]
    Read,
    /// Write-only.
    #[serde(rename = "w")]
    Write,
    /// Read/write.
    #[serde(rename = "rw")]
    ReadWrite,
    /// Read-only, but cleared by a write.
    #[serde(rename = "rt_w")]
    ReadClearOnWrite,
    /// Read and write have distinct set/clear semantics.
    #[serde(rename = "r_w")]
    ReadWriteDistinct,
    /// Reserved: reads return a fixed pattern, writes are ignored or must
    /// carry the reset pattern.
    #[serde(rename = "res")]
    Reserved,
}

impl Access {
    /// Whether a write through the encode path is meaningful for this field.
    /// `r` and `res` fields reject encoding outright.
    pub fn is_encodable(self) -> bool {
        !matches!(self, Access::Read | Access::Reserved)
    }

    pub fn is_readable(self) -> bool {
        !matches!(self, Access::Write)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Access::Read => "r",
            Access::Write => "w",
            Access::ReadWrite => "rw",
            Access::ReadClearOnWrite => "rt_w",
            Access::ReadWriteDistinct => "r_w",
            Access::Reserved => "res",
        }
    }
}

impl std::fmt::Display for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw bit-field record within a register.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBitField {
    pub name: String,
    pub start_bit: u8,
    pub end_bit: u8,
    #[serde(default)]
    pub description: String,
    pub access: Access,
}

/// A raw memory-map node as supplied to the builder.
///
/// `start` and `end` are unparsed text; `offset`, `reset_value`, `size` and
/// `bit_fields` only carry meaning for register nodes.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    pub id: String,
    pub name: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<RawKind>,
    #[serde(default)]
    pub children: Vec<RawNode>,
    #[serde(default)]
    pub offset: Option<String>,
    #[serde(default)]
    pub reset_value: Option<String>,
    #[serde(default)]
    pub size: Option<RegisterWidth>,
    #[serde(default)]
    pub bit_fields: Vec<RawBitField>,
}
