//! Composite map element records and the closed element set.
//!
//! Records here are plain immutable values: reconstruction always produces a
//! fresh, independently owned record, never a view into caller data. Id 0 is
//! reserved as the sentinel meaning "no valid record"; expansion returns it
//! when a delta has no usable reference, and callers must treat it as a data
//! fault rather than an empty element.

use serde::{Deserialize, Serialize};

use crate::types::{ElementId, ElementKind, PackedCoord, RoleId};

/// Id value reserved for sentinel records.
pub const SENTINEL_ID: ElementId = 0;

/// Values that expose a stable element id.
pub trait Identified {
    /// Stable id of the underlying element.
    fn id(&self) -> ElementId;
}

/// Present-state way record: an ordered node-reference list plus the derived
/// coordinate cache kept in step with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WayRecord {
    /// Stable way identifier.
    pub id: ElementId,
    /// Ordered node references. Primary sequence field.
    pub nodes: Vec<ElementId>,
    /// Derived packed coordinates, one per node reference.
    pub geometry: Vec<PackedCoord>,
}

impl WayRecord {
    /// Sentinel record signalling "no matching reference".
    pub fn sentinel() -> Self {
        Self::default()
    }

    /// True when this is the id-0 sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.id == SENTINEL_ID
    }
}

impl Identified for WayRecord {
    fn id(&self) -> ElementId {
        self.id
    }
}

/// Reference to one member element of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberRef {
    /// Kind of the referenced element.
    pub kind: ElementKind,
    /// Id of the referenced element.
    pub id: ElementId,
    /// Role the member plays within the relation.
    pub role: RoleId,
}

/// Present-state relation record: an ordered member-reference list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RelationRecord {
    /// Stable relation identifier.
    pub id: ElementId,
    /// Ordered member references. Primary sequence field.
    pub members: Vec<MemberRef>,
}

impl RelationRecord {
    /// Sentinel record signalling "no matching reference".
    pub fn sentinel() -> Self {
        Self::default()
    }

    /// True when this is the id-0 sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.id == SENTINEL_ID
    }
}

impl Identified for RelationRecord {
    fn id(&self) -> ElementId {
        self.id
    }
}

/// The closed set of composite element records handled by this core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Element {
    /// Way record.
    Way(WayRecord),
    /// Relation record.
    Relation(RelationRecord),
}

impl Element {
    /// Kind of the wrapped record.
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Way(_) => ElementKind::Way,
            Self::Relation(_) => ElementKind::Relation,
        }
    }

    /// True when the wrapped record is the id-0 sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.id() == SENTINEL_ID
    }

    /// True when the primary sequence field holds nothing.
    ///
    /// An empty primary field is how the pre-creation version of an element
    /// is represented: archiving it produces the full-snapshot form with
    /// empty content, and reconstructing it yields this.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Way(way) => way.nodes.is_empty(),
            Self::Relation(relation) => relation.members.is_empty(),
        }
    }
}

impl Identified for Element {
    fn id(&self) -> ElementId {
        match self {
            Self::Way(way) => way.id,
            Self::Relation(relation) => relation.id,
        }
    }
}
