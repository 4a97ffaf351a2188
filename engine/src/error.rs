// Licensed under the Apache-2.0 license

//! Error taxonomy of the engine.
//!
//! Build-time violations are accumulated into a `Vec<ValidationError>` and
//! returned together so one pass over the data surfaces the complete defect
//! list. Query-time "not modeled" outcomes (an unresolved address, an absent
//! id) are ordinary values, not errors; only the codec paths have hard
//! failures.

use chipmap_schema::addr::{AddrError, AddressRange};
use chipmap_schema::node::Access;
use thiserror::Error;

/// A structural violation found while building the tree.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A textual address on the node failed to normalize.
    #[error("node {id}: {source}")]
    Parse {
        id: String,
        #[source]
        source: AddrError,
    },
    /// A child's range escapes its parent's bounds.
    #[error("child {child} {child_range} escapes parent {parent} {parent_range}")]
    Containment {
        parent: String,
        child: String,
        parent_range: AddressRange,
        child_range: AddressRange,
    },
    /// Two sibling ranges overlap.
    #[error("sibling ranges overlap: {a} {a_range} and {b} {b_range}")]
    SiblingOverlap {
        a: String,
        b: String,
        a_range: AddressRange,
        b_range: AddressRange,
    },
    /// Two bit-fields of one register overlap.
    #[error("register {register}: bit-fields {a} and {b} overlap")]
    FieldOverlap {
        register: String,
        a: String,
        b: String,
    },
    /// An id appears more than once anywhere in the tree.
    #[error("duplicate node id {id}")]
    DuplicateId { id: String },
    /// A bit-field's end bit does not fit the register width.
    #[error("register {register}: field {field} ends at bit {end_bit} but the register is {bits} bits wide")]
    FieldWidth {
        register: String,
        field: String,
        end_bit: u8,
        bits: u32,
    },
    /// A bit-field declares `start_bit > end_bit`.
    #[error("register {register}: field {field} declares start bit {start_bit} above end bit {end_bit}")]
    FieldRange {
        register: String,
        field: String,
        start_bit: u8,
        end_bit: u8,
    },
    /// The declared reset value does not fit the register width.
    #[error("register {register}: reset value {reset:#x} does not fit in {bits} bits")]
    ResetValue {
        register: String,
        reset: u64,
        bits: u32,
    },
}

/// Decode-path failure.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("node {id} is a {kind}, not a register")]
    NotARegister { id: String, kind: &'static str },
    /// The raw value carries bits above the register's declared width.
    /// Reported rather than silently truncated.
    #[error("raw value {raw:#x} does not fit the {bits}-bit register {id}")]
    RawTooWide { id: String, raw: u64, bits: u32 },
}

/// Encode-path failure.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("node {id} is a {kind}, not a register")]
    NotARegister { id: String, kind: &'static str },
    #[error("register {register} has no field named {field}")]
    UnknownField { register: String, field: String },
    /// Encoding against an `r` or `res` field is always a hard error.
    #[error("field {field} of register {register} is {access} and rejects writes")]
    NotWritable {
        register: String,
        field: String,
        access: Access,
    },
    /// The supplied value does not fit the field's bit capacity.
    #[error("value {value:#x} does not fit in the {bits}-bit field {field} of register {register}")]
    Overflow {
        register: String,
        field: String,
        value: u64,
        bits: u32,
    },
}
