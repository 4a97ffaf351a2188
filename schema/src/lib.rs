// Licensed under the Apache-2.0 license

//! Raw memory-map schema and textual address parsing.
//!
//! This crate defines the input shapes consumed by the `chipmap-engine`
//! builder: the raw node/bit-field records as they appear in a chip's
//! memory-map description, and the parser that normalizes the heterogeneous
//! textual address forms those records carry (`"0x4000 0000"`,
//! `"Offset: 0x0C"`, `"32-bit"`) into plain integers.
//!
//! ## Module Organization
//!
//! - [`addr`]: address text grammar, [`addr::AddressSpace`] bounds, and
//!   [`addr::AddressRange`]
//! - [`node`]: serde-deserializable raw records ([`node::RawNode`],
//!   [`node::RawBitField`]) and the shared enums ([`node::Access`],
//!   [`node::RegisterWidth`])

pub mod addr;
pub mod node;

pub use addr::{AddrError, AddressRange, AddressSpace};
pub use node::{Access, RawBitField, RawKind, RawNode, RegisterWidth};
