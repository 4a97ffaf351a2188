// Licensed under the Apache-2.0 license

//! Memory-map index and address/bit decode engine.
//!
//! Builds an immutable, queryable index over a chip's declared address-space
//! hierarchy (blocks, buses, peripherals, registers, bit-fields), validating
//! the geometry on the way in: child ranges must sit inside their parents,
//! siblings must not overlap, bit-fields must fit their register and each
//! other, and ids must be globally unique. Once built, the map answers three
//! questions without ever mutating: which chain of regions encloses an
//! address, which node carries an id, and what a raw register value means
//! field by field (or how to assemble one).
//!
//! ```no_run
//! use chipmap_engine::{codec, MemoryMap};
//! use chipmap_schema::RawNode;
//!
//! let raw: Vec<RawNode> = serde_json::from_str(&std::fs::read_to_string("map.json").unwrap()).unwrap();
//! let map = MemoryMap::build(&raw).expect("validation failed");
//! for node in map.resolve(0x4000_0000) {
//!     println!("{} {}", node.id, node.range);
//! }
//! if let Some(node) = map.lookup_by_id("tim2_cr1") {
//!     let decoded = codec::decode(node, 0x0011).unwrap();
//!     println!("{:?}", decoded.fields);
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`map`]: the arena-backed immutable tree ([`MemoryMap`], [`Node`],
//!   [`NodeKind`])
//! - [`build`]: raw input to validated tree, all violations collected
//! - [`resolve`]: address to root-to-leaf chain
//! - [`codec`]: raw value to named fields and back
//! - [`error`]: the error taxonomy
//!
//! The map is immutable after construction and safe to share across threads;
//! every query is a pure read.

pub mod build;
pub mod codec;
pub mod error;
pub mod map;
mod resolve;

pub use build::Builder;
pub use codec::{decode, encode, Decoded};
pub use error::{CodecError, EncodeError, ValidationError};
pub use map::{BitField, MemoryMap, Node, NodeIdx, NodeKind, Register};

// The schema types travel through the public API; re-export the crate.
pub use chipmap_schema as schema;
