//! Entity delta envelopes: one variant per composite element kind.
//!
//! A delta is created exactly once, at write time, as the edit script that
//! turns the superseding (`reference`) version back into the version it
//! retired (`target`). It is immutable afterwards. Each envelope runs the
//! sequence codec independently over its record's ordered fields and adds a
//! size-bounded full-snapshot fallback: once the primary field's added run
//! reaches half of the target's own primary length, the scripts are
//! discarded and the complete target content is stored instead, which bounds
//! the worst case near one full snapshot plus a fixed header.

use serde::{Deserialize, Serialize};

use crate::codec::{SeqDelta, apply_delta, compute_delta};
use crate::element::{Element, Identified, MemberRef, RelationRecord, WayRecord};
use crate::types::{ElementId, ElementKind, PackedCoord};

use super::wire::{self, WireError};

/// Shared capability interface of every delta envelope kind.
pub trait DeltaEnvelope: Sized {
    /// Record type this envelope diffs and reconstructs.
    type Record;

    /// Builds the write-time edit script from `reference` back to `target`.
    fn construct(reference: &Self::Record, target: &Self::Record) -> Self;

    /// Reconstructs the target version from `reference`.
    ///
    /// Takes the reference by value so an unchanged record passes through
    /// without a copy. Returns the id-0 sentinel when the envelope is not
    /// `full` and the reference id does not match; callers must treat that
    /// as a data fault, never as an empty-but-valid record.
    fn expand(&self, reference: Self::Record) -> Self::Record;

    /// Appends the binary wire form.
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), WireError>;

    /// Decodes the binary wire form produced by [`DeltaEnvelope::encode`].
    fn decode(bytes: &[u8]) -> Result<Self, WireError>;
}

/// Edit script between two versions of a way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WayDelta {
    /// Way id both versions share.
    pub id: ElementId,
    /// Full-snapshot fallback flag. When set, every removed list is empty
    /// and every added list carries the complete target content tagged
    /// 0..n-1.
    pub full: bool,
    /// Script over the node-reference list. Primary field.
    pub nodes: SeqDelta<ElementId>,
    /// Script over the derived coordinate cache.
    pub geometry: SeqDelta<PackedCoord>,
}

impl WayDelta {
    fn full_snapshot(target: &WayRecord) -> Self {
        Self {
            id: target.id,
            full: true,
            nodes: complete(&target.nodes),
            geometry: complete(&target.geometry),
        }
    }
}

impl DeltaEnvelope for WayDelta {
    type Record = WayRecord;

    fn construct(reference: &WayRecord, target: &WayRecord) -> Self {
        if reference.id != target.id {
            // No valid reference; a relative diff would be meaningless.
            return Self::full_snapshot(target);
        }

        let nodes = compute_delta(&target.nodes, &reference.nodes);
        if nodes.added.len() * 2 >= target.nodes.len() {
            return Self::full_snapshot(target);
        }

        Self {
            id: target.id,
            full: false,
            nodes,
            geometry: compute_delta(&target.geometry, &reference.geometry),
        }
    }

    fn expand(&self, reference: WayRecord) -> WayRecord {
        if self.full {
            return WayRecord {
                id: self.id,
                nodes: values(&self.nodes),
                geometry: values(&self.geometry),
            };
        }
        if reference.id != self.id {
            return WayRecord::sentinel();
        }
        WayRecord {
            id: self.id,
            nodes: apply_delta(reference.nodes, &self.nodes),
            geometry: apply_delta(reference.geometry, &self.geometry),
        }
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<(), WireError> {
        wire::encode_way(self, out)
    }

    fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        wire::decode_way(bytes)
    }
}

/// Edit script between two versions of a relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDelta {
    /// Relation id both versions share.
    pub id: ElementId,
    /// Full-snapshot fallback flag; same invariant as [`WayDelta::full`].
    pub full: bool,
    /// Script over the member-reference list. Primary field.
    pub members: SeqDelta<MemberRef>,
}

impl RelationDelta {
    fn full_snapshot(target: &RelationRecord) -> Self {
        Self {
            id: target.id,
            full: true,
            members: complete(&target.members),
        }
    }
}

impl DeltaEnvelope for RelationDelta {
    type Record = RelationRecord;

    fn construct(reference: &RelationRecord, target: &RelationRecord) -> Self {
        if reference.id != target.id {
            return Self::full_snapshot(target);
        }

        let members = compute_delta(&target.members, &reference.members);
        if members.added.len() * 2 >= target.members.len() {
            return Self::full_snapshot(target);
        }

        Self {
            id: target.id,
            full: false,
            members,
        }
    }

    fn expand(&self, reference: RelationRecord) -> RelationRecord {
        if self.full {
            return RelationRecord {
                id: self.id,
                members: values(&self.members),
            };
        }
        if reference.id != self.id {
            return RelationRecord::sentinel();
        }
        RelationRecord {
            id: self.id,
            members: apply_delta(reference.members, &self.members),
        }
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<(), WireError> {
        wire::encode_relation(self, out)
    }

    fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        wire::decode_relation(bytes)
    }
}

/// The closed set of delta envelopes, tagged by element kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementDelta {
    /// Way envelope.
    Way(WayDelta),
    /// Relation envelope.
    Relation(RelationDelta),
}

impl ElementDelta {
    /// Kind of the element this delta belongs to.
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Way(_) => ElementKind::Way,
            Self::Relation(_) => ElementKind::Relation,
        }
    }

    /// True when this envelope carries a full snapshot.
    pub fn is_full(&self) -> bool {
        match self {
            Self::Way(delta) => delta.full,
            Self::Relation(delta) => delta.full,
        }
    }

    /// Builds the write-time edit script between two element versions.
    ///
    /// A kind clash between the two versions leaves no valid reference, so
    /// the result degrades to a full snapshot of the target, exactly like an
    /// id mismatch.
    pub fn construct_element(reference: &Element, target: &Element) -> Self {
        match (reference, target) {
            (Element::Way(reference), Element::Way(target)) => {
                Self::Way(WayDelta::construct(reference, target))
            }
            (Element::Relation(reference), Element::Relation(target)) => {
                Self::Relation(RelationDelta::construct(reference, target))
            }
            (_, Element::Way(target)) => {
                Self::Way(WayDelta::construct(&WayRecord::sentinel(), target))
            }
            (_, Element::Relation(target)) => {
                Self::Relation(RelationDelta::construct(&RelationRecord::sentinel(), target))
            }
        }
    }

    /// Reconstructs the target element version.
    ///
    /// `reference` is consumed; a missing or kind-mismatched reference is
    /// replaced by the sentinel record, so a non-`full` envelope yields the
    /// sentinel result the caller must treat as a broken chain.
    pub fn expand_element(&self, reference: Option<Element>) -> Element {
        match self {
            Self::Way(delta) => {
                let reference = match reference {
                    Some(Element::Way(way)) => way,
                    _ => WayRecord::sentinel(),
                };
                Element::Way(delta.expand(reference))
            }
            Self::Relation(delta) => {
                let reference = match reference {
                    Some(Element::Relation(relation)) => relation,
                    _ => RelationRecord::sentinel(),
                };
                Element::Relation(delta.expand(reference))
            }
        }
    }

    /// Appends the binary wire form (kind-tagged).
    pub fn encode(&self, out: &mut Vec<u8>) -> Result<(), WireError> {
        match self {
            Self::Way(delta) => delta.encode(out),
            Self::Relation(delta) => delta.encode(out),
        }
    }

    /// Decodes a kind-tagged binary envelope.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        wire::decode_element(bytes)
    }
}

impl Identified for ElementDelta {
    fn id(&self) -> ElementId {
        match self {
            Self::Way(delta) => delta.id,
            Self::Relation(delta) => delta.id,
        }
    }
}

/// Complete-content script: the whole slice as added entries tagged 0..n-1.
fn complete<T: Clone>(content: &[T]) -> SeqDelta<T> {
    SeqDelta {
        removed: Vec::new(),
        added: content
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, value)| (index as u32, value))
            .collect(),
    }
}

/// Added-list values in list order, for expanding a full snapshot.
fn values<T: Clone>(script: &SeqDelta<T>) -> Vec<T> {
    script.added.iter().map(|(_, value)| value.clone()).collect()
}
