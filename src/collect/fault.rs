//! Recoverable per-record faults raised during collection.
//!
//! Faults never cross the collector boundary as errors: each one is logged,
//! recorded here for diagnostics, and the offending record is dropped while
//! the rest of the bucket proceeds.

use serde::{Deserialize, Serialize};

use crate::types::{ElementId, ElementKind, Timestamp};

/// Why a record was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultReason {
    /// A delta's id has no valid reference: no Current record and no
    /// already-reconstructed candidate to expand against.
    MissingReference,
    /// The same `(id, timestamp)` pair was observed twice across the merged
    /// current/delta streams.
    DuplicateObservation,
}

/// One dropped record, with enough context to find it in the source data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainFault {
    /// Element id the record belonged to.
    pub id: ElementId,
    /// Element kind of the record.
    pub kind: ElementKind,
    /// Instant stamped on the dropped record.
    pub timestamp: Timestamp,
    /// Why it was dropped.
    pub reason: FaultReason,
}
