//! Write-time assembly of one element's version chain.

use thiserror::Error;

use crate::delta::envelope::ElementDelta;
use crate::element::{Element, RelationRecord, WayRecord};
use crate::types::Timestamp;
use crate::versioned::Versioned;

/// Rejected revision instants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// Instant does not advance past the previous revision.
    #[error("revision instant {at:?} does not advance past {last:?}")]
    NonMonotonic {
        /// Most recent accepted instant.
        last: Timestamp,
        /// Rejected instant.
        at: Timestamp,
    },
    /// `NOW` and `ZERO` are reserved and never valid revision instants.
    #[error("reserved instant {0:?} cannot stamp a revision")]
    ReservedInstant(Timestamp),
}

/// Accumulates the present version of one element plus the delta chain its
/// edits left behind.
///
/// Each [`revise`](Self::revise) retires the previous version at the given
/// instant by constructing exactly one immutable delta against the version
/// superseding it. Deltas are kept newest-first, ready to feed the
/// collector's backward walk.
#[derive(Debug, Clone)]
pub struct ElementHistory {
    current: Element,
    deltas: Vec<Versioned<ElementDelta>>,
    last_instant: Timestamp,
}

impl ElementHistory {
    /// Starts a history at its initial version.
    pub fn begin(initial: Element) -> Self {
        Self {
            current: initial,
            deltas: Vec::new(),
            last_instant: Timestamp::ZERO,
        }
    }

    /// Starts a history for an element created at instant `at`.
    ///
    /// The creation itself is archived: a delta stamped `at` whose target is
    /// the empty pre-creation version of the element, so queries before `at`
    /// resolve to "did not yet exist".
    pub fn created(at: Timestamp, initial: Element) -> Result<Self, HistoryError> {
        let before = match &initial {
            Element::Way(way) => Element::Way(WayRecord {
                id: way.id,
                ..WayRecord::default()
            }),
            Element::Relation(relation) => Element::Relation(RelationRecord {
                id: relation.id,
                ..RelationRecord::default()
            }),
        };
        let mut history = Self::begin(before);
        history.revise(at, initial)?;
        Ok(history)
    }

    /// Replaces the current version with `next` at instant `at`, archiving
    /// the retired version as a delta stamped `at`.
    pub fn revise(&mut self, at: Timestamp, next: Element) -> Result<(), HistoryError> {
        if at == Timestamp::NOW || at == Timestamp::ZERO {
            return Err(HistoryError::ReservedInstant(at));
        }
        if at <= self.last_instant {
            return Err(HistoryError::NonMonotonic {
                last: self.last_instant,
                at,
            });
        }

        let delta = ElementDelta::construct_element(&next, &self.current);
        self.deltas.insert(0, Versioned::new(delta, at));
        self.current = next;
        self.last_instant = at;
        Ok(())
    }

    /// Present version.
    pub fn current(&self) -> &Element {
        &self.current
    }

    /// Delta chain, newest first.
    pub fn deltas(&self) -> &[Versioned<ElementDelta>] {
        &self.deltas
    }

    /// Consumes the history into its present version and delta chain.
    pub fn into_parts(self) -> (Element, Vec<Versioned<ElementDelta>>) {
        (self.current, self.deltas)
    }
}
