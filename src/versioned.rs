//! Point-in-time decoration for current records and deltas.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::delta::envelope::ElementDelta;
use crate::delta::wire::WireError;
use crate::element::Identified;
use crate::types::Timestamp;

/// A wrapped value paired with the instant it refers to.
///
/// Applied at write time and immutable afterwards. Equality requires both
/// the wrapped value and the timestamp to match. On the wire the timestamp's
/// 5 bytes follow immediately after the wrapped value's own serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    /// Wrapped current record or delta.
    pub value: T,
    /// Instant this entry refers to. [`Timestamp::NOW`] for present state;
    /// for a delta, the instant its value was superseded.
    pub timestamp: Timestamp,
}

impl<T> Versioned<T> {
    /// Pairs a value with its instant.
    pub fn new(value: T, timestamp: Timestamp) -> Self {
        Self { value, timestamp }
    }
}

impl<T: Identified> Versioned<T> {
    /// Chain ordering: id ascending, then later timestamps first.
    ///
    /// Sorting a delta stream with this comparator is what lets the
    /// collector walk each id's chain strictly backward through time.
    pub fn chain_cmp(&self, other: &Self) -> Ordering {
        self.value
            .id()
            .cmp(&other.value.id())
            .then_with(|| other.timestamp.cmp(&self.timestamp))
    }
}

impl Versioned<ElementDelta> {
    /// Appends the wrapped delta's wire form followed by the timestamp.
    pub fn encode(&self, out: &mut Vec<u8>) -> Result<(), WireError> {
        self.value.encode(out)?;
        self.timestamp.encode_into(out);
        Ok(())
    }

    /// Splits the trailing timestamp off and decodes the wrapped delta.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() < Timestamp::WIRE_LEN {
            return Err(WireError::Truncated {
                offset: 0,
                needed: Timestamp::WIRE_LEN,
                len: bytes.len(),
            });
        }
        let (value_bytes, stamp_bytes) = bytes.split_at(bytes.len() - Timestamp::WIRE_LEN);
        let mut raw = [0u8; Timestamp::WIRE_LEN];
        raw.copy_from_slice(stamp_bytes);
        Ok(Self {
            value: ElementDelta::decode(value_bytes)?,
            timestamp: Timestamp::from_wire(raw),
        })
    }
}
