// Licensed under the Apache-2.0 license

//! Bit-field codec: raw register values to named fields and back.
//!
//! Decode extracts `(raw >> start_bit) & ((1 << width) - 1)` per declared
//! field and reports which bit positions no field claims, since the data
//! leaves their behavior undefined. Encode starts from the reset value,
//! range-checks every supplied field value, and hard-rejects writes to `r`
//! and `res` fields. Both directions return new values; nothing here
//! mutates the map.

use std::collections::BTreeMap;

use crate::error::{CodecError, EncodeError};
use crate::map::Node;

/// Result of decoding a raw value against a register's fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decoded {
    /// Field name to extracted value, for every declared field regardless of
    /// its access mode.
    pub fields: BTreeMap<String, u64>,
    /// Bit positions within the register width claimed by no declared field.
    /// Implicitly reserved; their read/write behavior is undefined by the
    /// data, so they are surfaced instead of assumed.
    pub unclaimed_mask: u64,
}

/// Decode a raw register value into its named fields.
///
/// A raw value wider than the register's declared width is rejected rather
/// than silently truncated.
pub fn decode(node: &Node, raw: u64) -> Result<Decoded, CodecError> {
    let register = node.as_register().ok_or_else(|| CodecError::NotARegister {
        id: node.id.clone(),
        kind: node.kind.name(),
    })?;
    if raw & !register.width.mask() != 0 {
        return Err(CodecError::RawTooWide {
            id: node.id.clone(),
            raw,
            bits: register.width.bits(),
        });
    }
    let mut fields = BTreeMap::new();
    let mut claimed = 0u64;
    for field in &register.bit_fields {
        fields.insert(field.name.clone(), field.extract(raw));
        claimed |= field.mask();
    }
    Ok(Decoded {
        fields,
        unclaimed_mask: register.width.mask() & !claimed,
    })
}

/// Encode named field values into a raw register value.
///
/// Fields not supplied keep their reset bits. Each supplied value must fit
/// its field's bit capacity, and the field must accept writes (`r` and `res`
/// fields always reject encoding; consulting `access` beforehand is still
/// the caller's job for the softer modes).
pub fn encode(node: &Node, values: &BTreeMap<String, u64>) -> Result<u64, EncodeError> {
    let register = node.as_register().ok_or_else(|| EncodeError::NotARegister {
        id: node.id.clone(),
        kind: node.kind.name(),
    })?;
    let mut raw = register.reset_value & register.width.mask();
    for (name, &value) in values {
        let field = register
            .field(name)
            .ok_or_else(|| EncodeError::UnknownField {
                register: node.id.clone(),
                field: name.clone(),
            })?;
        if !field.access.is_encodable() {
            return Err(EncodeError::NotWritable {
                register: node.id.clone(),
                field: name.clone(),
                access: field.access,
            });
        }
        if value > field.value_mask() {
            return Err(EncodeError::Overflow {
                register: node.id.clone(),
                field: name.clone(),
                value,
                bits: field.width_bits(),
            });
        }
        raw = (raw & !field.mask()) | (value << field.start_bit);
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{BitField, MemoryMap, Node, NodeKind, Register};
    use chipmap_schema::addr::AddressRange;
    use chipmap_schema::node::{Access, RegisterWidth};

    fn bit_field(name: &str, start_bit: u8, end_bit: u8, access: Access) -> BitField {
        BitField {
            name: name.to_string(),
            start_bit,
            end_bit,
            access,
            description: String::new(),
        }
    }

    /// The TIM2 control register scenario: width 16, CEN@0 and DIR@4, both rw.
    fn tim2_cr1() -> Node {
        Node {
            id: "tim2_cr1".to_string(),
            name: "TIMx_CR1".to_string(),
            description: None,
            range: AddressRange::new(0x4000_0000, 0x4000_0003),
            kind: NodeKind::Register(Register {
                offset: Some(0),
                reset_value: 0x0000,
                width: RegisterWidth::Bits16,
                bit_fields: vec![
                    bit_field("CEN", 0, 0, Access::ReadWrite),
                    bit_field("DIR", 4, 4, Access::ReadWrite),
                ],
            }),
            parent: None,
            children: Vec::new(),
        }
    }

    fn status_reg() -> Node {
        Node {
            id: "status".to_string(),
            name: "STATUS".to_string(),
            description: None,
            range: AddressRange::new(0x1000, 0x1003),
            kind: NodeKind::Register(Register {
                offset: None,
                reset_value: 0x0000_4400,
                width: RegisterWidth::Bits32,
                bit_fields: vec![
                    bit_field("MODE", 0, 3, Access::ReadWrite),
                    bit_field("READY", 8, 8, Access::Read),
                    bit_field("CLEAR", 9, 9, Access::ReadClearOnWrite),
                    bit_field("PAD", 16, 31, Access::Reserved),
                ],
            }),
            parent: None,
            children: Vec::new(),
        }
    }

    #[test]
    fn decode_extracts_fields() {
        let node = tim2_cr1();
        let decoded = decode(&node, 0x0011).unwrap();
        assert_eq!(decoded.fields["CEN"], 1);
        assert_eq!(decoded.fields["DIR"], 1);
        // Everything except bits 0 and 4 is unclaimed in a 16-bit register.
        assert_eq!(decoded.unclaimed_mask, 0xFFEE);
    }

    #[test]
    fn encode_keeps_reset_bits_for_unsupplied_fields() {
        let node = tim2_cr1();
        let mut values = BTreeMap::new();
        values.insert("CEN".to_string(), 0);
        // DIR defaults to its reset bit, which is 0.
        assert_eq!(encode(&node, &values).unwrap(), 0x0000);
        values.insert("DIR".to_string(), 1);
        assert_eq!(encode(&node, &values).unwrap(), 0x0010);
    }

    #[test]
    fn encode_baseline_is_the_reset_value() {
        let node = status_reg();
        let mut values = BTreeMap::new();
        values.insert("MODE".to_string(), 0x5);
        // Reset bits outside MODE survive.
        assert_eq!(encode(&node, &values).unwrap(), 0x0000_4405);
    }

    #[test]
    fn decode_rejects_values_wider_than_the_register() {
        let node = tim2_cr1();
        assert_eq!(
            decode(&node, 0x1_0000),
            Err(CodecError::RawTooWide {
                id: "tim2_cr1".to_string(),
                raw: 0x1_0000,
                bits: 16,
            })
        );
    }

    #[test]
    fn encode_rejects_overflowing_values() {
        let node = status_reg();
        let mut values = BTreeMap::new();
        values.insert("MODE".to_string(), 0x10);
        assert_eq!(
            encode(&node, &values),
            Err(EncodeError::Overflow {
                register: "status".to_string(),
                field: "MODE".to_string(),
                value: 0x10,
                bits: 4,
            })
        );
    }

    #[test]
    fn encode_rejects_read_only_and_reserved_fields() {
        let node = status_reg();
        let mut values = BTreeMap::new();
        values.insert("READY".to_string(), 1);
        assert!(matches!(
            encode(&node, &values),
            Err(EncodeError::NotWritable {
                access: Access::Read,
                ..
            })
        ));
        let mut values = BTreeMap::new();
        values.insert("PAD".to_string(), 0);
        assert!(matches!(
            encode(&node, &values),
            Err(EncodeError::NotWritable {
                access: Access::Reserved,
                ..
            })
        ));
        // Cleared-on-write fields accept the encode path.
        let mut values = BTreeMap::new();
        values.insert("CLEAR".to_string(), 0);
        assert!(encode(&node, &values).is_ok());
    }

    #[test]
    fn encode_rejects_unknown_fields() {
        let node = tim2_cr1();
        let mut values = BTreeMap::new();
        values.insert("BOGUS".to_string(), 1);
        assert_eq!(
            encode(&node, &values),
            Err(EncodeError::UnknownField {
                register: "tim2_cr1".to_string(),
                field: "BOGUS".to_string(),
            })
        );
    }

    #[test]
    fn codec_requires_a_register_node() {
        let map = MemoryMap::build(&[chipmap_schema::node::RawNode {
            id: "bus".to_string(),
            name: "BUS".to_string(),
            start: "0x0".to_string(),
            end: "0xFFF".to_string(),
            kind: Some(chipmap_schema::node::RawKind::Region),
            ..Default::default()
        }])
        .unwrap();
        let node = map.lookup_by_id("bus").unwrap();
        assert_eq!(
            decode(node, 0),
            Err(CodecError::NotARegister {
                id: "bus".to_string(),
                kind: "region",
            })
        );
        assert!(matches!(
            encode(node, &BTreeMap::new()),
            Err(EncodeError::NotARegister { .. })
        ));
    }

    #[test]
    fn round_trip_for_writable_registers() {
        // All-rw register: encode(decode(v)) == v for width-masked values.
        let node = Node {
            kind: NodeKind::Register(Register {
                offset: None,
                reset_value: 0,
                width: RegisterWidth::Bits16,
                bit_fields: vec![
                    bit_field("A", 0, 3, Access::ReadWrite),
                    bit_field("B", 4, 11, Access::ReadWrite),
                    bit_field("C", 12, 15, Access::ReadWrite),
                ],
            }),
            ..tim2_cr1()
        };
        for raw in [0x0000u64, 0x0011, 0xA5A5, 0xFFFF, 0x8001] {
            let decoded = decode(&node, raw).unwrap();
            assert_eq!(encode(&node, &decoded.fields).unwrap(), raw);
        }
    }
}
