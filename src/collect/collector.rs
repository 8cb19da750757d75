//! The time-travel collector.
//!
//! Merges a present-state stream and a historical-delta stream per spatial
//! bucket and resolves, for every element id, the single version that was in
//! force at the query instant. The pass is single-threaded, synchronous, and
//! bounded: per-bucket state is discarded when the bucket completes, so
//! memory does not grow with total dataset size. The only suspension point
//! is the cooperative health probe.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::delta::envelope::ElementDelta;
use crate::element::{Element, Identified, SENTINEL_ID};
use crate::types::{BucketKey, ElementId, Timestamp};
use crate::versioned::Versioned;

use super::cursor::BucketCursor;
use super::fault::{ChainFault, FaultReason};

/// Tuning for one collection call.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Records or bucket boundaries processed between health probes.
    pub health_check_every: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            health_check_every: 4096,
        }
    }
}

/// Signal that a collection call must stop and discard its partial results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("collection aborted: {reason}")]
pub struct CollectAbort {
    /// Why the probe stopped the call.
    pub reason: String,
}

impl CollectAbort {
    /// Builds an abort signal with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Failure of a whole collection call. Per-record faults never surface
/// here; they are logged, recorded, and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectError {
    /// The cooperative health probe stopped the call.
    #[error(transparent)]
    Aborted(#[from] CollectAbort),
}

/// Caller-supplied health and resource check.
///
/// Probed after a bounded count of records or buckets; returning an error
/// aborts the current collection call (never the process).
pub trait HealthProbe {
    /// Reports whether the call may continue.
    fn check(&mut self) -> Result<(), CollectAbort>;
}

/// Probe that always reports healthy.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unchecked;

impl HealthProbe for Unchecked {
    fn check(&mut self) -> Result<(), CollectAbort> {
        Ok(())
    }
}

/// Winners of one collection call, keyed by spatial bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectOutput {
    /// Winners whose timestamp is `NOW`, in id order per bucket.
    pub current: BTreeMap<BucketKey, Vec<Element>>,
    /// Historical winners with the instant they were superseded, in id
    /// order per bucket. Empty whenever the query instant is `NOW`.
    pub attic: BTreeMap<BucketKey, Vec<Versioned<Element>>>,
    /// Records dropped along the way, for diagnostics.
    pub faults: Vec<ChainFault>,
}

/// Per-id walk state within one bucket.
struct ChainState {
    /// Most recent reconstruction (or the seeded Current clone). Doubles as
    /// the candidate value for selection: walking timestamp-descending means
    /// the latest reconstruction is the smallest-instant candidate.
    reference: Option<Element>,
    /// Instant of the best (smallest-timestamp) recorded candidate.
    best_instant: Option<Timestamp>,
    /// Previous instant seen for this id, for duplicate detection.
    last_instant: Timestamp,
    faulted: bool,
}

/// Single-pass time-travel collector over two bucket-ordered cursors.
pub struct Collector<P: HealthProbe> {
    config: CollectorConfig,
    probe: P,
    since_check: usize,
}

impl<P: HealthProbe> Collector<P> {
    /// Builds a collector with the given config and health probe.
    pub fn new(config: CollectorConfig, probe: P) -> Self {
        let config = CollectorConfig {
            health_check_every: config.health_check_every.max(1),
        };
        Self {
            config,
            probe,
            since_check: 0,
        }
    }

    /// Resolves, per bucket and id, the version in force at `at`.
    ///
    /// `current` yields present-state records in `(bucket, id)` order;
    /// `deltas` yields historical deltas in `(bucket, id)` order, newest
    /// first within an id. Both cursors must reflect one consistent read
    /// snapshot; this call owns them exclusively. Only deltas stamped
    /// strictly after `at` are materialized — older history cannot hold the
    /// version in force at `at`. With `at == Timestamp::NOW` the attic map
    /// stays empty and every winner is a Current record. A winner that turns
    /// out to be the empty pre-creation snapshot of its element is omitted:
    /// the element did not yet exist at `at`.
    pub fn collect<C, D>(
        &mut self,
        mut current: C,
        mut deltas: D,
        at: Timestamp,
    ) -> Result<CollectOutput, CollectError>
    where
        C: BucketCursor<Item = Element>,
        D: BucketCursor<Item = Versioned<ElementDelta>>,
    {
        let mut out = CollectOutput::default();

        loop {
            let bucket = match (current.current(), deltas.current()) {
                (None, None) => break,
                (Some(entry), None) => entry.bucket,
                (None, Some(entry)) => entry.bucket,
                (Some(a), Some(b)) => a.bucket.min(b.bucket),
            };

            let mut records: Vec<Element> = Vec::new();
            while let Some(entry) = current.current() {
                if entry.bucket != bucket {
                    break;
                }
                records.push(entry.value.clone());
                current.advance();
                self.tick()?;
            }

            let mut history: Vec<Versioned<ElementDelta>> = Vec::new();
            while let Some(entry) = deltas.current() {
                if entry.bucket != bucket {
                    break;
                }
                let versioned = entry.value;
                if versioned.timestamp == Timestamp::ZERO {
                    // Zero instant marks "no historical record exists".
                    debug!(
                        id = entry.id,
                        "zero-stamped delta treated as absent"
                    );
                } else if versioned.timestamp > at {
                    history.push(versioned.clone());
                }
                deltas.advance();
                self.tick()?;
            }

            self.process_bucket(bucket, records, history, &mut out);
            self.tick()?;
        }

        Ok(out)
    }

    /// Walks one bucket's chains backward and selects the winners.
    fn process_bucket(
        &mut self,
        bucket: BucketKey,
        records: Vec<Element>,
        mut history: Vec<Versioned<ElementDelta>>,
        out: &mut CollectOutput,
    ) {
        let mut current_by_id: HashMap<ElementId, Element> =
            records.into_iter().map(|record| (record.id(), record)).collect();

        // Chain order: id ascending, newest instant first.
        history.sort_by(Versioned::chain_cmp);

        let mut states: HashMap<ElementId, ChainState> = HashMap::new();

        for entry in &history {
            let id = entry.value.id();
            let state = states.entry(id).or_insert_with(|| {
                let seed = current_by_id.get(&id).cloned();
                ChainState {
                    last_instant: if seed.is_some() {
                        Timestamp::NOW
                    } else {
                        Timestamp::ZERO
                    },
                    reference: seed,
                    best_instant: None,
                    faulted: false,
                }
            });

            if state.faulted {
                continue;
            }

            // Validate before consuming the reference: a broken link must
            // not destroy the last good reconstruction.
            let expandable = id != SENTINEL_ID
                && (entry.value.is_full()
                    || state
                        .reference
                        .as_ref()
                        .is_some_and(|el| el.id() == id && el.kind() == entry.value.kind()));
            if !expandable {
                warn!(
                    id,
                    kind = ?entry.value.kind(),
                    timestamp = entry.timestamp.get(),
                    "delta has no valid reference; dropping the rest of this chain"
                );
                out.faults.push(ChainFault {
                    id,
                    kind: entry.value.kind(),
                    timestamp: entry.timestamp,
                    reason: FaultReason::MissingReference,
                });
                state.faulted = true;
                continue;
            }

            let duplicate = entry.timestamp == state.last_instant;
            let reconstructed = entry.value.expand_element(state.reference.take());

            if duplicate {
                debug!(
                    id,
                    timestamp = entry.timestamp.get(),
                    "duplicate (id, timestamp) observation"
                );
                out.faults.push(ChainFault {
                    id,
                    kind: entry.value.kind(),
                    timestamp: entry.timestamp,
                    reason: FaultReason::DuplicateObservation,
                });
            } else {
                state.best_instant = Some(entry.timestamp);
            }

            state.reference = Some(reconstructed);
            state.last_instant = entry.timestamp;
        }

        // Per id, the entry with the smallest instant wins: every candidate
        // instant is strictly greater than the query instant, and a delta's
        // instant is the moment its value was superseded, so the smallest
        // one is the value still in force at the query instant.
        let mut current_winners: Vec<(ElementId, Element)> = Vec::new();
        let mut attic_winners: Vec<(ElementId, Versioned<Element>)> = Vec::new();

        for (id, state) in states {
            if let (Some(instant), Some(value)) = (state.best_instant, state.reference) {
                current_by_id.remove(&id);
                if instant.is_now() {
                    current_winners.push((id, value));
                } else if value.is_empty() {
                    // The winning version is the empty pre-creation snapshot:
                    // the element did not yet exist at the query instant.
                    debug!(id, instant = instant.get(), "element not yet created; omitted");
                } else {
                    attic_winners.push((id, Versioned::new(value, instant)));
                }
            }
        }

        for (id, record) in current_by_id {
            current_winners.push((id, record));
        }

        current_winners.sort_by_key(|(id, _)| *id);
        attic_winners.sort_by_key(|(id, _)| *id);

        trace!(
            bucket,
            current = current_winners.len(),
            attic = attic_winners.len(),
            "bucket collected"
        );

        if !current_winners.is_empty() {
            out.current.insert(
                bucket,
                current_winners.into_iter().map(|(_, record)| record).collect(),
            );
        }
        if !attic_winners.is_empty() {
            out.attic.insert(
                bucket,
                attic_winners.into_iter().map(|(_, entry)| entry).collect(),
            );
        }
    }

    fn tick(&mut self) -> Result<(), CollectError> {
        self.since_check += 1;
        if self.since_check >= self.config.health_check_every {
            self.since_check = 0;
            self.probe.check()?;
        }
        Ok(())
    }
}
