//! Per-element header parsing and payload materialization: record the
//! offset, read the identifier keeping its marker bit, read the size
//! clearing it (or detect unknown-size), resolve against the schema,
//! then decode or skip the payload depending on the caller's
//! traversal policy.

use crate::error::{Error, Result};
use crate::options::ParseOptions;
use crate::schema::{self, ElementKind, SchemaEntry};
use crate::source::{self, Source};
use crate::tree::Value;
use crate::vint::{self, Id};

/// An element's header, independent of whether its payload has been
/// materialized yet.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Header {
    pub id: Id,
    pub offset: u64,
    pub header_len: u32,
    pub size: Option<u64>,
    pub schema: Option<&'static SchemaEntry>,
}

impl Header {
    pub(crate) fn payload_offset(&self) -> u64 {
        self.offset + u64::from(self.header_len)
    }

    pub(crate) fn end_offset(&self) -> Option<u64> {
        self.size.map(|size| self.payload_offset() + size)
    }

    /// The schema name, or the sentinel used for identifiers the DTD
    /// doesn't know.
    pub(crate) fn name(&self) -> &'static str {
        self.schema.map(SchemaEntry::name).unwrap_or("Unknown")
    }

    pub(crate) fn is_container(&self) -> bool {
        self.schema.is_some_and(|s| s.kind == ElementKind::Container)
    }
}

fn read_u8(source: &mut impl Source) -> Result<u8> {
    let mut b = [0u8; 1];
    std::io::Read::read_exact(source, &mut b)?;
    Ok(b[0])
}

/// Reads one VINT field from the stream. `keep_marker` selects
/// identifier semantics (marker bit retained) versus size semantics
/// (marker bit cleared).
///
/// The only stream-specific work here is sizing the lookahead: the
/// first byte alone determines the encoded width, so that's read first
/// to know how many more bytes to pull off the stream. Once the full
/// VINT is in hand, decoding it is delegated to `vint.rs`'s codec
/// (the same one the in-memory payload decoders use) rather than
/// re-deriving the marker-bit/leading-zeros arithmetic here.
fn read_raw_vint(source: &mut impl Source, keep_marker: bool) -> Result<(u64, u32)> {
    let offset = source::position(source)?;
    let first = read_u8(source)?;
    let width = (first.leading_zeros() + 1) as usize;
    if width > 8 {
        return Err(Error::InvalidVIntAt(offset));
    }
    let mut bytes = [0u8; 8];
    bytes[0] = first;
    if width > 1 {
        let rest = source::read_vec(source, width - 1)?;
        bytes[1..width].copy_from_slice(&rest);
    }
    let mut slice: &[u8] = &bytes[..width];
    if keep_marker {
        let (id, consumed) = vint::read_identifier(&mut slice)?;
        Ok((id.0, consumed))
    } else {
        vint::read_raw_vint(&mut slice)
    }
}

/// Reads and resolves the next element's header at the stream's current
/// position. `parent_path` is the schema path of the enclosing
/// container, or `""` at the top level.
pub(crate) fn read_header(source: &mut impl Source, parent_path: &str) -> Result<Header> {
    let offset = source::position(source)?;
    let (id_value, id_width) = read_raw_vint(source, true)?;
    if vint::is_reserved_id(id_value, id_width) {
        return Err(Error::structure(offset, format!("reserved identifier 0x{id_value:X}")));
    }
    let id = Id(id_value);

    let (size_value, size_width) = read_raw_vint(source, false)?;
    let payload_bits = 7 * size_width;
    let all_ones = if payload_bits >= 64 { u64::MAX } else { (1u64 << payload_bits) - 1 };
    let size = if size_value == all_ones { None } else { Some(size_value) };

    let schema = schema::resolve(parent_path, id.0);

    Ok(Header {
        id,
        offset,
        header_len: id_width + size_width,
        size,
        schema,
    })
}

/// Reads a known-size element's full payload into memory.
pub(crate) fn read_payload_bytes(source: &mut impl Source, header: &Header) -> Result<Vec<u8>> {
    let size = header
        .size
        .ok_or_else(|| Error::structure(header.offset, "cannot materialize an unknown-size element's bytes"))?;
    source::read_vec(source, size as usize)
}

/// Seeks past a known-size element's payload without reading it.
pub(crate) fn skip_payload(source: &mut impl Source, header: &Header) -> Result<()> {
    let end = header
        .end_offset()
        .ok_or_else(|| Error::structure(header.offset, "cannot skip an unknown-size element"))?;
    source::seek_to(source, end)
}

/// Reads and decodes a leaf's value, honoring `ParseOptions::binary_size_limit`
/// for binary-kind leaves. `SeekID` is always read in full, since jump
/// resolution depends on its bytes. The stream is left positioned at the
/// element's end regardless of how much of the payload was actually read.
pub(crate) fn read_leaf_value(source: &mut impl Source, header: &Header, options: &ParseOptions) -> Result<Value> {
    let is_binary = header.schema.map(|s| s.kind) == Some(ElementKind::Binary);
    let is_seek_id = header.name() == "SeekID";
    if is_binary && !is_seek_id && options.binary_size_limit >= 0 {
        let declared = header
            .size
            .ok_or_else(|| Error::structure(header.offset, "cannot materialize an unknown-size element's bytes"))?;
        let limit = options.binary_size_limit as u64;
        let take = declared.min(limit);
        let bytes = source::read_vec(source, take as usize)?;
        source::seek_to(source, header.payload_offset() + declared)?;
        return Ok(Value::Binary(bytes));
    }
    let bytes = read_payload_bytes(source, header)?;
    decode_payload(header, &bytes)
}

/// Decodes a leaf payload according to the element's resolved schema
/// type. An element unknown to the DTD is treated as opaque binary,
/// with a warning.
pub(crate) fn decode_payload(header: &Header, bytes: &[u8]) -> Result<Value> {
    let kind = header.schema.map(|s| s.kind).unwrap_or_else(|| {
        log::warn!("unknown element {} at offset {}, treating as binary", header.id, header.offset);
        ElementKind::Binary
    });
    Ok(match kind {
        ElementKind::Container => Value::Container,
        ElementKind::Uint => Value::Uint(vint::decode_uint(bytes)?),
        ElementKind::Int => Value::Int(vint::decode_int(bytes)?),
        ElementKind::Float => Value::Float(vint::decode_float(bytes)?),
        ElementKind::String => Value::String(vint::decode_string(bytes)),
        ElementKind::Date => Value::Date(vint::decode_date(bytes)?),
        ElementKind::Binary => Value::Binary(bytes.to_vec()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_ebml_header_and_resolves_schema() {
        let mut cursor = Cursor::new(vec![0x1A, 0x45, 0xDF, 0xA3, 0x84, 0, 0, 0, 0]);
        let header = read_header(&mut cursor, "").unwrap();
        assert_eq!(header.id.0, 0x1A45_DFA3);
        assert_eq!(header.header_len, 5);
        assert_eq!(header.size, Some(4));
        assert_eq!(header.name(), "Ebml");
        assert!(header.is_container());
    }

    #[test]
    fn unknown_size_has_no_end_offset() {
        let mut cursor = Cursor::new(vec![0x18, 0x53, 0x80, 0x67, 0xFF]);
        let header = read_header(&mut cursor, "").unwrap();
        assert_eq!(header.size, None);
        assert_eq!(header.end_offset(), None);
    }

    #[test]
    fn skip_then_read_next_sibling() {
        // EbmlVersion(1, value=1) immediately followed by DocType("webm").
        let mut cursor = Cursor::new(vec![0x42, 0x86, 0x81, 0x01, 0x42, 0x82, 0x84, b'w', b'e', b'b', b'm']);
        let header = read_header(&mut cursor, "Ebml").unwrap();
        assert_eq!(header.name(), "EbmlVersion");
        skip_payload(&mut cursor, &header).unwrap();
        let next = read_header(&mut cursor, "Ebml").unwrap();
        assert_eq!(next.name(), "DocType");
        let bytes = read_payload_bytes(&mut cursor, &next).unwrap();
        assert_eq!(vint::decode_string(&bytes), "webm");
    }

    #[test]
    fn unknown_identifier_decodes_as_binary() {
        let header = Header { id: Id(0x1234), offset: 0, header_len: 2, size: Some(2), schema: None };
        let value = decode_payload(&header, &[0xAB, 0xCD]).unwrap();
        assert!(matches!(value, Value::Binary(b) if b == vec![0xAB, 0xCD]));
    }
}
