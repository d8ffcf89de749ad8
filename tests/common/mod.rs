//! Hand-built EBML byte sequences for the integration tests in this
//! directory. Mirrors the style of a literal hex byte array fed through
//! a cursor rather than reusing the crate's internal VINT codec, so a
//! bug in that codec can't hide a bug in its own test.

/// Encodes an EBML identifier at its canonical minimal width. `id`
/// already carries its marker bit (e.g. `0xAE` for TrackEntry, `0x1F43B675`
/// for Cluster), matching how every id constant in this crate is spelled.
pub fn vid(id: u64) -> Vec<u8> {
    let bytes = id.to_be_bytes();
    let first_nonzero = bytes.iter().position(|b| *b != 0).unwrap_or(7);
    bytes[first_nonzero..].to_vec()
}

/// Encodes a known-size VINT at the narrowest width that fits `value`.
pub fn vsize(value: u64) -> Vec<u8> {
    for width in 1u32..=8 {
        let max = if 7 * width >= 64 { u64::MAX - 1 } else { (1u64 << (7 * width)) - 2 };
        if value <= max {
            let mut out = vec![0u8; width as usize];
            let mut v = value;
            for i in (0..width as usize).rev() {
                out[i] = (v & 0xFF) as u8;
                v >>= 8;
            }
            out[0] |= 1 << (8 - width);
            return out;
        }
    }
    panic!("value {value} too large for an 8-byte VINT");
}

/// The unknown-size sentinel, encoded at the given width (all payload
/// bits set to one).
pub fn vsize_unknown(width: usize) -> Vec<u8> {
    vec![0xFF; width]
}

/// Minimal big-endian byte encoding of an unsigned integer payload.
pub fn uint_bytes(value: u64) -> Vec<u8> {
    if value == 0 {
        return vec![0];
    }
    let bytes = value.to_be_bytes();
    let first_nonzero = bytes.iter().position(|b| *b != 0).unwrap();
    bytes[first_nonzero..].to_vec()
}

/// Wraps a full element: identifier, known size, payload.
pub fn el(id: u64, payload: &[u8]) -> Vec<u8> {
    let mut out = vid(id);
    out.extend(vsize(payload.len() as u64));
    out.extend_from_slice(payload);
    out
}

/// Wraps an element whose payload is a concatenation of other elements.
pub fn container(id: u64, children: &[Vec<u8>]) -> Vec<u8> {
    let payload: Vec<u8> = children.iter().flatten().copied().collect();
    el(id, &payload)
}

/// Wraps an element with an unknown-size header, for exercising the
/// terminator-scan path.
pub fn unknown_size_container(id: u64, children: &[Vec<u8>]) -> Vec<u8> {
    let mut out = vid(id);
    out.extend(vsize_unknown(1));
    for c in children {
        out.extend_from_slice(c);
    }
    out
}

pub fn uint_el(id: u64, value: u64) -> Vec<u8> {
    el(id, &uint_bytes(value))
}

pub fn string_el(id: u64, value: &str) -> Vec<u8> {
    el(id, value.as_bytes())
}

// A handful of element ids used across these tests.
pub const EBML: u64 = 0x1A45_DFA3;
pub const DOC_TYPE: u64 = 0x4282;
pub const SEGMENT: u64 = 0x1853_8067;
pub const SEEK_HEAD: u64 = 0x114D_9B74;
pub const SEEK: u64 = 0x4DBB;
pub const SEEK_ID: u64 = 0x53AB;
pub const SEEK_POSITION: u64 = 0x53AC;
pub const INFO: u64 = 0x1549_A966;
pub const TIMECODE_SCALE: u64 = 0x2AD7_B1;
pub const MUXING_APP: u64 = 0x4D80;
pub const TRACKS: u64 = 0x1654_AE6B;
pub const TRACK_ENTRY: u64 = 0xAE;
pub const TRACK_NUMBER: u64 = 0xD7;
pub const TRACK_TYPE: u64 = 0x83;
pub const CODEC_ID: u64 = 0x86;
pub const CLUSTER: u64 = 0x1F43_B675;
pub const CLUSTER_TIMECODE: u64 = 0xE7;
pub const SIMPLE_BLOCK: u64 = 0xA3;
pub const BLOCK_GROUP: u64 = 0xA0;
pub const BLOCK: u64 = 0xA1;
pub const REFERENCE_BLOCK: u64 = 0xFB;
pub const CUES: u64 = 0x1C53_BB6B;
pub const CUE_POINT: u64 = 0xBB;
pub const CUE_TIME: u64 = 0xB3;
pub const CUE_TRACK_POSITIONS: u64 = 0xB7;
pub const CUE_TRACK: u64 = 0xF7;
pub const CUE_CLUSTER_POSITION: u64 = 0xF1;
pub const TAGS: u64 = 0x1254_C367;
pub const TAG: u64 = 0x7373;
pub const VIDEO: u64 = 0xE0;
pub const PIXEL_WIDTH: u64 = 0xB0;

/// A minimal valid EBML header (DocType "matroska").
pub fn ebml_header() -> Vec<u8> {
    container(EBML, &[string_el(DOC_TYPE, "matroska")])
}

/// A SimpleBlock payload: track number (as a size-style VINT), a 2-byte
/// relative i16 timecode, and a 1-byte flags byte.
pub fn simple_block_payload(track: u8, rel_timecode: i16, keyframe: bool) -> Vec<u8> {
    let mut out = vec![0x80 | track];
    out.extend_from_slice(&rel_timecode.to_be_bytes());
    out.push(if keyframe { 0x80 } else { 0x00 });
    out
}
