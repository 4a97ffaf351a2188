// Licensed under the Apache-2.0 license

//! Region tree builder and validator.
//!
//! One depth-first pass over the raw nodes resolves every textual range,
//! checks the geometric invariants (containment, sibling disjointness,
//! bit-field disjointness, global id uniqueness) and produces the immutable
//! indexed [`MemoryMap`]. Validation is exhaustive rather than fail-fast:
//! every violation found in the pass is returned, so one correction cycle
//! sees the full defect list. Construction is all-or-nothing; a tree with
//! any violation is discarded entirely.

use std::collections::HashMap;

use chipmap_schema::addr::{parse_hex_literal, AddressRange, AddressSpace, StartText};
use chipmap_schema::node::{RawKind, RawNode, RegisterWidth};

use crate::error::ValidationError;
use crate::map::{BitField, MemoryMap, Node, NodeIdx, NodeKind, Register};

/// Label used when reporting a root node that escapes the address space.
const SPACE_LABEL: &str = "(address space)";

/// Build configuration. The only knob is the platform address width.
#[derive(Clone, Copy, Debug, Default)]
pub struct Builder {
    space: AddressSpace,
}

impl Builder {
    pub fn new() -> Self {
        Builder::default()
    }

    pub fn with_space(space: AddressSpace) -> Self {
        Builder { space }
    }

    /// Construct a validated map from raw top-level nodes.
    ///
    /// Root ranges are checked against the full address-space bound.
    pub fn build(&self, raw: &[RawNode]) -> Result<MemoryMap, Vec<ValidationError>> {
        let mut pass = BuildPass {
            space: self.space,
            nodes: Vec::new(),
            by_id: HashMap::new(),
            errors: Vec::new(),
        };
        let bound = AddressRange::new(0, self.space.max_address());
        let roots = pass.add_level(raw, None, bound, SPACE_LABEL, None);
        if !pass.errors.is_empty() {
            return Err(pass.errors);
        }
        log::debug!(
            "indexed {} nodes ({} top-level) in a {}-bit space",
            pass.nodes.len(),
            roots.len(),
            self.space.bits()
        );
        Ok(MemoryMap {
            nodes: pass.nodes,
            roots,
            by_id: pass.by_id,
            space: self.space,
        })
    }
}

impl MemoryMap {
    /// Build with the default 32-bit address space.
    pub fn build(raw: &[RawNode]) -> Result<MemoryMap, Vec<ValidationError>> {
        Builder::new().build(raw)
    }
}

struct BuildPass {
    space: AddressSpace,
    nodes: Vec<Node>,
    by_id: HashMap<String, NodeIdx>,
    errors: Vec<ValidationError>,
}

impl BuildPass {
    /// Process one sibling set. Returns the surviving indices sorted by
    /// `range.start`. `base` is the parent's start address, used to resolve
    /// offset-form children.
    fn add_level(
        &mut self,
        raw_level: &[RawNode],
        parent: Option<NodeIdx>,
        bound: AddressRange,
        parent_label: &str,
        base: Option<u64>,
    ) -> Vec<NodeIdx> {
        let mut level = Vec::with_capacity(raw_level.len());
        for raw in raw_level {
            if let Some(idx) = self.add_node(raw, parent, bound, parent_label, base) {
                level.push(idx);
            }
        }
        // Establish the ordering the resolver's binary search relies on.
        // Input order is not trusted.
        level.sort_by_key(|&idx| (self.nodes[idx].range.start, self.nodes[idx].range.end));
        // Sweep the sorted level. Every earlier sibling whose range still
        // reaches the new start overlaps it, not just the adjacent one, so
        // one pass names the complete pair list.
        let mut open: Vec<NodeIdx> = Vec::new();
        for &idx in &level {
            let range = self.nodes[idx].range;
            open.retain(|&prev| self.nodes[prev].range.end >= range.start);
            for &prev in &open {
                self.errors.push(ValidationError::SiblingOverlap {
                    a: self.nodes[prev].id.clone(),
                    b: self.nodes[idx].id.clone(),
                    a_range: self.nodes[prev].range,
                    b_range: range,
                });
            }
            open.push(idx);
        }
        level
    }

    /// Resolve and validate a single node, then recurse into its children.
    /// Returns `None` when the node's own range failed to parse; its subtree
    /// is skipped since nothing can be checked against an unknown range.
    fn add_node(
        &mut self,
        raw: &RawNode,
        parent: Option<NodeIdx>,
        bound: AddressRange,
        parent_label: &str,
        base: Option<u64>,
    ) -> Option<NodeIdx> {
        let duplicate = self.by_id.contains_key(&raw.id);
        if duplicate {
            self.errors.push(ValidationError::DuplicateId {
                id: raw.id.clone(),
            });
        }

        let resolved = match self.space.resolve_range(&raw.start, &raw.end, base) {
            Ok(resolved) => resolved,
            Err(source) => {
                self.errors.push(ValidationError::Parse {
                    id: raw.id.clone(),
                    source,
                });
                return None;
            }
        };
        let range = resolved.range;

        if !bound.encloses(&range) {
            self.errors.push(ValidationError::Containment {
                parent: parent_label.to_string(),
                child: raw.id.clone(),
                parent_range: bound,
                child_range: range,
            });
        }

        let kind = self.node_kind(raw, resolved.width, range, base);

        let idx = self.nodes.len();
        self.nodes.push(Node {
            id: raw.id.clone(),
            name: raw.name.clone(),
            description: raw.description.clone(),
            range,
            kind,
            parent,
            children: Vec::new(),
        });
        if !duplicate {
            self.by_id.insert(raw.id.clone(), idx);
        }

        let children = self.add_level(&raw.children, Some(idx), range, &raw.id, Some(range.start));
        self.nodes[idx].children = children;
        Some(idx)
    }

    /// Determine the node's kind, inferring it when the input omits `type`.
    fn node_kind(
        &mut self,
        raw: &RawNode,
        marker_width: Option<RegisterWidth>,
        range: AddressRange,
        base: Option<u64>,
    ) -> NodeKind {
        let declared = raw.kind;
        let kind = match declared {
            Some(RawKind::Block) => return NodeKind::Block,
            Some(RawKind::Region) => return NodeKind::Region,
            Some(RawKind::Peripheral) => return NodeKind::Peripheral,
            Some(RawKind::Reserved) => return NodeKind::Reserved,
            Some(RawKind::Register) => RawKind::Register,
            None => {
                let register_shaped = marker_width.is_some()
                    || raw.offset.is_some()
                    || !raw.bit_fields.is_empty()
                    || matches!(
                        self.space.parse_start(&raw.start),
                        Ok(StartText::Offset(_))
                    );
                let inferred = if register_shaped {
                    RawKind::Register
                } else {
                    RawKind::Region
                };
                log::warn!(
                    "node {}: no type declared, inferred {:?}",
                    raw.id,
                    inferred
                );
                inferred
            }
        };
        match kind {
            RawKind::Register => NodeKind::Register(self.register(raw, marker_width, range, base)),
            _ => NodeKind::Region,
        }
    }

    /// Assemble and validate the register payload.
    fn register(
        &mut self,
        raw: &RawNode,
        marker_width: Option<RegisterWidth>,
        range: AddressRange,
        base: Option<u64>,
    ) -> Register {
        let width = match (raw.size, marker_width) {
            (Some(declared), Some(marker)) => {
                if declared != marker {
                    log::warn!(
                        "register {}: declared size {} disagrees with {}-bit end marker",
                        raw.id,
                        declared,
                        marker
                    );
                }
                declared
            }
            (Some(declared), None) => declared,
            (None, Some(marker)) => marker,
            (None, None) => RegisterWidth::Bits32,
        };

        let reset_value = match &raw.reset_value {
            None => 0,
            Some(text) => match parse_hex_literal(text) {
                Ok(value) => {
                    if value & !width.mask() != 0 {
                        self.errors.push(ValidationError::ResetValue {
                            register: raw.id.clone(),
                            reset: value,
                            bits: width.bits(),
                        });
                    }
                    value
                }
                Err(source) => {
                    self.errors.push(ValidationError::Parse {
                        id: raw.id.clone(),
                        source,
                    });
                    0
                }
            },
        };

        let offset = match &raw.offset {
            None => None,
            Some(text) => match parse_hex_literal(text) {
                Ok(offset) => {
                    if let Some(base) = base {
                        if base.checked_add(offset) != Some(range.start) {
                            log::warn!(
                                "register {}: declared offset {:#x} disagrees with range start {:#010x}",
                                raw.id,
                                offset,
                                range.start
                            );
                        }
                    }
                    Some(offset)
                }
                Err(source) => {
                    self.errors.push(ValidationError::Parse {
                        id: raw.id.clone(),
                        source,
                    });
                    None
                }
            },
        };

        let mut bit_fields: Vec<BitField> = Vec::with_capacity(raw.bit_fields.len());
        for field in &raw.bit_fields {
            if field.start_bit > field.end_bit {
                self.errors.push(ValidationError::FieldRange {
                    register: raw.id.clone(),
                    field: field.name.clone(),
                    start_bit: field.start_bit,
                    end_bit: field.end_bit,
                });
                continue;
            }
            if field.end_bit as u32 >= width.bits() {
                self.errors.push(ValidationError::FieldWidth {
                    register: raw.id.clone(),
                    field: field.name.clone(),
                    end_bit: field.end_bit,
                    bits: width.bits(),
                });
            }
            bit_fields.push(BitField {
                name: field.name.clone(),
                start_bit: field.start_bit,
                end_bit: field.end_bit,
                access: field.access,
                description: field.description.clone(),
            });
        }
        bit_fields.sort_by_key(|f| (f.start_bit, f.end_bit));
        for pair in bit_fields.windows(2) {
            if pair[1].start_bit <= pair[0].end_bit {
                self.errors.push(ValidationError::FieldOverlap {
                    register: raw.id.clone(),
                    a: pair[0].name.clone(),
                    b: pair[1].name.clone(),
                });
            }
        }

        Register {
            offset,
            reset_value,
            width,
            bit_fields,
        }
    }
}
