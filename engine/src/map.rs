// Licensed under the Apache-2.0 license

//! The immutable indexed memory-map tree.
//!
//! Nodes live in an arena ([`MemoryMap::nodes`]) and reference each other by
//! index, so deep variable-shape nesting never turns into owned recursive
//! structures. The arena is append-only during the build and frozen
//! afterwards: a successfully built [`MemoryMap`] is never mutated, which is
//! what makes it freely shareable across concurrent readers.

use std::collections::HashMap;

use chipmap_schema::addr::{AddressRange, AddressSpace};
use chipmap_schema::node::{Access, RegisterWidth};

/// Index into the node arena. Stable for the lifetime of the map.
pub type NodeIdx = usize;

//=============================================================================
// Node kinds
//=============================================================================

/// Closed kind of a memory-map node.
///
/// `Register` is the only variant carrying bit-level detail; the payload is
/// unreachable for every other kind, so "read bitFields off a bus" is not
/// expressible.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Block,
    Region,
    Peripheral,
    Reserved,
    Register(Register),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Block => "block",
            NodeKind::Region => "region",
            NodeKind::Peripheral => "peripheral",
            NodeKind::Reserved => "reserved",
            NodeKind::Register(_) => "register",
        }
    }
}

/// Register-only attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Register {
    /// Byte offset from the enclosing peripheral's base. Informational; the
    /// node's absolute range is authoritative.
    pub offset: Option<u64>,
    /// Raw value after hardware reset; the encode baseline.
    pub reset_value: u64,
    pub width: RegisterWidth,
    /// Declared fields, sorted by `start_bit`, pairwise disjoint.
    pub bit_fields: Vec<BitField>,
}

impl Register {
    pub fn field(&self, name: &str) -> Option<&BitField> {
        self.bit_fields.iter().find(|f| f.name == name)
    }
}

/// A named contiguous bit range within a register.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitField {
    pub name: String,
    pub start_bit: u8,
    pub end_bit: u8,
    pub access: Access,
    pub description: String,
}

impl BitField {
    pub fn width_bits(&self) -> u32 {
        (self.end_bit - self.start_bit + 1) as u32
    }

    /// Mask of the field's value range, unshifted (low `width_bits` bits).
    pub fn value_mask(&self) -> u64 {
        if self.width_bits() >= 64 {
            u64::MAX
        } else {
            (1u64 << self.width_bits()) - 1
        }
    }

    /// Mask of the field's bit positions within the register.
    pub fn mask(&self) -> u64 {
        self.value_mask() << self.start_bit
    }

    pub fn extract(&self, raw: u64) -> u64 {
        (raw >> self.start_bit) & self.value_mask()
    }
}

//=============================================================================
// Nodes and the map
//=============================================================================

/// A validated memory-map node.
#[derive(Clone, Debug)]
pub struct Node {
    /// Globally unique id.
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub range: AddressRange,
    pub kind: NodeKind,
    pub parent: Option<NodeIdx>,
    /// Child indices, sorted by `range.start`; sibling ranges are disjoint.
    pub children: Vec<NodeIdx>,
}

impl Node {
    pub fn as_register(&self) -> Option<&Register> {
        match &self.kind {
            NodeKind::Register(register) => Some(register),
            _ => None,
        }
    }

    pub fn is_reserved(&self) -> bool {
        matches!(self.kind, NodeKind::Reserved)
    }
}

/// An immutable, indexed memory map for one chip.
///
/// Built once from raw input by [`crate::build::Builder`]; every query
/// (resolve, decode, encode, id lookup) is a pure read. Loading a different
/// chip produces an entirely new value.
#[derive(Clone, Debug)]
pub struct MemoryMap {
    pub(crate) nodes: Vec<Node>,
    /// Top-level node indices, sorted by `range.start`.
    pub(crate) roots: Vec<NodeIdx>,
    pub(crate) by_id: HashMap<String, NodeIdx>,
    pub(crate) space: AddressSpace,
}

impl MemoryMap {
    pub fn node(&self, idx: NodeIdx) -> &Node {
        &self.nodes[idx]
    }

    pub fn roots(&self) -> &[NodeIdx] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn space(&self) -> AddressSpace {
        self.space
    }

    /// Flat lookup by globally unique id. Absence is an ordinary outcome.
    pub fn lookup_by_id(&self, id: &str) -> Option<&Node> {
        self.by_id.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn lookup_idx(&self, id: &str) -> Option<NodeIdx> {
        self.by_id.get(id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }
}
