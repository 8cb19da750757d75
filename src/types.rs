//! Shared primitive IDs, kinds, and the 40-bit timestamp.

use serde::{Deserialize, Serialize};

/// Stable map element identifier. Real elements use ids >= 1; id 0 is the
/// sentinel reserved for "no valid record" (see [`crate::element`]).
pub type ElementId = u64;
/// Relation member role identifier. On the wire a role occupies 24 bits.
pub type RoleId = u32;
/// Opaque spatial bucket key. Produced by the external coordinate-based
/// subdivision; this crate only compares and groups by it.
pub type BucketKey = u32;

/// Map element kind bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    /// Single-coordinate element.
    Node,
    /// Ordered sequence of node references.
    Way,
    /// Ordered sequence of member references.
    Relation,
}

/// Fixed-point coordinate pair, packed as two offset-encoded 32-bit words
/// by the geometry pipeline. Opaque to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct PackedCoord {
    /// Offset-encoded latitude word.
    pub lat: u32,
    /// Offset-encoded longitude word.
    pub lon: u32,
}

/// A point-in-time instant, 40 bits wide on the wire.
///
/// Plain integer ordering applies: [`Timestamp::ZERO`] sorts below every
/// historical instant and [`Timestamp::NOW`] (the all-ones sentinel meaning
/// "present state, no historical lookup") sorts above all of them. `ZERO`
/// marks "no historical record exists" and is never a valid instant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Number of bytes a timestamp occupies on the wire.
    pub const WIRE_LEN: usize = 5;

    /// "No historical record exists" marker.
    pub const ZERO: Self = Self(0);

    /// Present-state sentinel: the largest 40-bit value.
    pub const NOW: Self = Self((1u64 << 40) - 1);

    /// Wraps a raw instant, truncated to the low 40 bits.
    pub fn new(instant: u64) -> Self {
        Self(instant & Self::NOW.0)
    }

    /// Raw instant value.
    pub fn get(self) -> u64 {
        self.0
    }

    /// True for the present-state sentinel.
    pub fn is_now(self) -> bool {
        self == Self::NOW
    }

    /// Appends the 5-byte little-endian wire form.
    pub fn encode_into(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0.to_le_bytes()[..Self::WIRE_LEN]);
    }

    /// Reads the 5-byte little-endian wire form.
    pub fn from_wire(bytes: [u8; Self::WIRE_LEN]) -> Self {
        let mut raw = [0u8; 8];
        raw[..Self::WIRE_LEN].copy_from_slice(&bytes);
        Self(u64::from_le_bytes(raw))
    }
}
