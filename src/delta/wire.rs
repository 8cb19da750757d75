//! Binary layout of delta envelopes.
//!
//! All decoding goes through typed helpers over byte slices with checked
//! bounds; no raw memory is ever aliased across types. Values are
//! little-endian throughout.
//!
//! # Envelope layout (version 1)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ offset 0   format_version  u8   (= WIRE_FORMAT_VERSION)     │
//! │ offset 1   kind_tag        u8   (1 = way, 2 = relation)     │
//! │ offset 2   id              u64                              │
//! │ offset 10  header, then tightly packed body                 │
//! └─────────────────────────────────────────────────────────────┘
//!
//! Way header, non-full:            Way header, full:
//!   10  nodes_removed     u32        10  FULL_MARKER      u32
//!   14  nodes_added       u32        14  nodes_added      u32
//!   18  geometry_removed  u32        18  geometry_added   u32
//!   22  geometry_added    u32        22  body
//!   26  body
//!
//! Relation header, non-full:       Relation header, full:
//!   10  members_removed   u32        10  FULL_MARKER      u32
//!   14  members_added     u32        14  members_added    u32
//!   18  body                         18  body
//! ```
//!
//! The body packs each field's removed positions (4 bytes each) followed by
//! its added pairs (4-byte position + fixed-width value): node references
//! are 8 bytes, coordinates 8 bytes (two 32-bit words), members 12 bytes
//! (8-byte id + one packed word holding the kind tag in the top 8 bits and
//! the role in the low 24).

use thiserror::Error;

use crate::codec::SeqDelta;
use crate::element::MemberRef;
use crate::types::{ElementKind, PackedCoord, RoleId};

use super::envelope::{ElementDelta, RelationDelta, WayDelta};

/// Version byte leading every encoded envelope.
pub const WIRE_FORMAT_VERSION: u8 = 1;

/// Header count sentinel marking the full-snapshot form.
pub const FULL_MARKER: u32 = u32::MAX;

const TAG_NODE: u8 = 0;
const TAG_WAY: u8 = 1;
const TAG_RELATION: u8 = 2;

const ROLE_BITS: u32 = 24;
const ROLE_MAX: RoleId = (1 << ROLE_BITS) - 1;

const POSITION_LEN: usize = 4;
const NODE_VALUE_LEN: usize = 8;
const COORD_VALUE_LEN: usize = 8;
const MEMBER_VALUE_LEN: usize = 12;

/// Decode/encode failure over the binary layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// Leading version byte is not one this build understands.
    #[error("unsupported wire format version: {0}")]
    UnsupportedVersion(u8),
    /// Kind tag does not name a composite element kind.
    #[error("unknown element kind tag: {0}")]
    UnknownKind(u8),
    /// Buffer ended before a required field.
    #[error("buffer truncated: needed {needed} bytes at offset {offset}, have {len}")]
    Truncated {
        /// Offset the read started at.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
        /// Total buffer length.
        len: usize,
    },
    /// A list is too long for the 32-bit count fields.
    #[error("list length {0} exceeds the wire count range")]
    CountOverflow(usize),
    /// A relation role does not fit the 24-bit wire range.
    #[error("relation role {0} exceeds the 24-bit wire range")]
    RoleOverflow(RoleId),
}

/// Bounds-checked sequential reader over a byte slice.
struct Reader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8], WireError> {
        let end = self.offset.checked_add(needed).ok_or(WireError::Truncated {
            offset: self.offset,
            needed,
            len: self.buf.len(),
        })?;
        if end > self.buf.len() {
            return Err(WireError::Truncated {
                offset: self.offset,
                needed,
                len: self.buf.len(),
            });
        }
        let bytes = &self.buf[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    fn u8(&mut self) -> Result<u8, WireError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, WireError> {
        let bytes = self.take(4)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(bytes);
        Ok(u32::from_le_bytes(raw))
    }

    fn u64(&mut self) -> Result<u64, WireError> {
        let bytes = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(raw))
    }

    /// Verifies `count` records of `width` bytes fit in the remainder
    /// before anything is allocated for them.
    fn ensure_records(&self, count: u32, width: usize) -> Result<(), WireError> {
        let needed = (count as usize)
            .checked_mul(width)
            .ok_or(WireError::CountOverflow(count as usize))?;
        if self.offset.saturating_add(needed) > self.buf.len() {
            return Err(WireError::Truncated {
                offset: self.offset,
                needed,
                len: self.buf.len(),
            });
        }
        Ok(())
    }
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn count(len: usize) -> Result<u32, WireError> {
    if len >= FULL_MARKER as usize {
        return Err(WireError::CountOverflow(len));
    }
    Ok(len as u32)
}

fn kind_tag(kind: ElementKind) -> u8 {
    match kind {
        ElementKind::Node => TAG_NODE,
        ElementKind::Way => TAG_WAY,
        ElementKind::Relation => TAG_RELATION,
    }
}

fn kind_from_tag(tag: u8) -> Result<ElementKind, WireError> {
    match tag {
        TAG_NODE => Ok(ElementKind::Node),
        TAG_WAY => Ok(ElementKind::Way),
        TAG_RELATION => Ok(ElementKind::Relation),
        other => Err(WireError::UnknownKind(other)),
    }
}

pub(super) fn encode_way(delta: &WayDelta, out: &mut Vec<u8>) -> Result<(), WireError> {
    out.push(WIRE_FORMAT_VERSION);
    out.push(TAG_WAY);
    put_u64(out, delta.id);

    if delta.full {
        put_u32(out, FULL_MARKER);
        put_u32(out, count(delta.nodes.added.len())?);
        put_u32(out, count(delta.geometry.added.len())?);
    } else {
        put_u32(out, count(delta.nodes.removed.len())?);
        put_u32(out, count(delta.nodes.added.len())?);
        put_u32(out, count(delta.geometry.removed.len())?);
        put_u32(out, count(delta.geometry.added.len())?);
    }

    if !delta.full {
        for position in &delta.nodes.removed {
            put_u32(out, *position);
        }
    }
    for (position, node) in &delta.nodes.added {
        put_u32(out, *position);
        put_u64(out, *node);
    }
    if !delta.full {
        for position in &delta.geometry.removed {
            put_u32(out, *position);
        }
    }
    for (position, coord) in &delta.geometry.added {
        put_u32(out, *position);
        put_u32(out, coord.lat);
        put_u32(out, coord.lon);
    }

    Ok(())
}

pub(super) fn encode_relation(delta: &RelationDelta, out: &mut Vec<u8>) -> Result<(), WireError> {
    out.push(WIRE_FORMAT_VERSION);
    out.push(TAG_RELATION);
    put_u64(out, delta.id);

    if delta.full {
        put_u32(out, FULL_MARKER);
        put_u32(out, count(delta.members.added.len())?);
    } else {
        put_u32(out, count(delta.members.removed.len())?);
        put_u32(out, count(delta.members.added.len())?);
    }

    if !delta.full {
        for position in &delta.members.removed {
            put_u32(out, *position);
        }
    }
    for (position, member) in &delta.members.added {
        if member.role > ROLE_MAX {
            return Err(WireError::RoleOverflow(member.role));
        }
        put_u32(out, *position);
        put_u64(out, member.id);
        put_u32(out, (u32::from(kind_tag(member.kind)) << ROLE_BITS) | member.role);
    }

    Ok(())
}

pub(super) fn decode_way(bytes: &[u8]) -> Result<WayDelta, WireError> {
    let mut reader = header(bytes, TAG_WAY)?;
    decode_way_body(&mut reader)
}

pub(super) fn decode_relation(bytes: &[u8]) -> Result<RelationDelta, WireError> {
    let mut reader = header(bytes, TAG_RELATION)?;
    decode_relation_body(&mut reader)
}

/// Decodes a kind-tagged envelope of either composite kind.
pub(super) fn decode_element(bytes: &[u8]) -> Result<ElementDelta, WireError> {
    let mut reader = Reader::new(bytes);
    check_version(&mut reader)?;
    match kind_from_tag(reader.u8()?)? {
        ElementKind::Way => Ok(ElementDelta::Way(decode_way_body(&mut reader)?)),
        ElementKind::Relation => Ok(ElementDelta::Relation(decode_relation_body(&mut reader)?)),
        ElementKind::Node => Err(WireError::UnknownKind(TAG_NODE)),
    }
}

fn check_version(reader: &mut Reader<'_>) -> Result<(), WireError> {
    let version = reader.u8()?;
    if version != WIRE_FORMAT_VERSION {
        return Err(WireError::UnsupportedVersion(version));
    }
    Ok(())
}

fn header<'a>(bytes: &'a [u8], expected_tag: u8) -> Result<Reader<'a>, WireError> {
    let mut reader = Reader::new(bytes);
    check_version(&mut reader)?;
    let tag = reader.u8()?;
    if tag != expected_tag {
        return Err(WireError::UnknownKind(tag));
    }
    Ok(reader)
}

fn decode_way_body(reader: &mut Reader<'_>) -> Result<WayDelta, WireError> {
    let id = reader.u64()?;
    let marker = reader.u32()?;
    let full = marker == FULL_MARKER;

    let (nodes_removed, nodes_added, geometry_removed, geometry_added) = if full {
        (0, reader.u32()?, 0, reader.u32()?)
    } else {
        (marker, reader.u32()?, reader.u32()?, reader.u32()?)
    };

    let nodes = SeqDelta {
        removed: decode_positions(reader, nodes_removed)?,
        added: decode_added(reader, nodes_added, NODE_VALUE_LEN, |r| r.u64())?,
    };
    let geometry = SeqDelta {
        removed: decode_positions(reader, geometry_removed)?,
        added: decode_added(reader, geometry_added, COORD_VALUE_LEN, |r| {
            Ok(PackedCoord {
                lat: r.u32()?,
                lon: r.u32()?,
            })
        })?,
    };

    Ok(WayDelta {
        id,
        full,
        nodes,
        geometry,
    })
}

fn decode_relation_body(reader: &mut Reader<'_>) -> Result<RelationDelta, WireError> {
    let id = reader.u64()?;
    let marker = reader.u32()?;
    let full = marker == FULL_MARKER;

    let (members_removed, members_added) = if full {
        (0, reader.u32()?)
    } else {
        (marker, reader.u32()?)
    };

    let members = SeqDelta {
        removed: decode_positions(reader, members_removed)?,
        added: decode_added(reader, members_added, MEMBER_VALUE_LEN, |r| {
            let id = r.u64()?;
            let packed = r.u32()?;
            Ok(MemberRef {
                kind: kind_from_tag((packed >> ROLE_BITS) as u8)?,
                id,
                role: packed & ROLE_MAX,
            })
        })?,
    };

    Ok(RelationDelta { id, full, members })
}

fn decode_positions(reader: &mut Reader<'_>, count: u32) -> Result<Vec<u32>, WireError> {
    reader.ensure_records(count, POSITION_LEN)?;
    let mut positions = Vec::with_capacity(count as usize);
    for _ in 0..count {
        positions.push(reader.u32()?);
    }
    Ok(positions)
}

fn decode_added<T>(
    reader: &mut Reader<'_>,
    count: u32,
    value_len: usize,
    mut value: impl FnMut(&mut Reader<'_>) -> Result<T, WireError>,
) -> Result<Vec<(u32, T)>, WireError> {
    reader.ensure_records(count, POSITION_LEN + value_len)?;
    let mut added = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let position = reader.u32()?;
        added.push((position, value(reader)?));
    }
    Ok(added)
}
