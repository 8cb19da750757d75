//! Versioned map-entity storage core with minimal-delta history and
//! time-travel collection.
//!
//! Every historical edit of a composite map element (way or relation) is
//! compressed into a minimal edit script relative to the version that
//! superseded it, and the exact version in force at any caller-supplied
//! instant can be reconstructed across bucketed streams in one bounded-memory
//! forward pass.
//!
//! # Examples
//!
//! Archiving one edit as a delta and reconstructing the retired version:
//! ```
//! use mapattic::{
//!     delta::envelope::{DeltaEnvelope, WayDelta},
//!     element::WayRecord,
//! };
//!
//! let was = WayRecord { id: 9, nodes: vec![1, 2, 3, 4, 5, 6], geometry: vec![] };
//! let now = WayRecord { id: 9, nodes: vec![1, 2, 9, 4, 5, 6], geometry: vec![] };
//!
//! // At write time the retiring version is archived relative to its successor.
//! let delta = WayDelta::construct(&now, &was);
//! assert!(!delta.full);
//! assert_eq!(delta.expand(now.clone()), was);
//! ```
//!
//! Collecting the version of an element in force at a historical instant:
//! ```
//! use mapattic::{
//!     collect::{
//!         collector::{Collector, CollectorConfig, Unchecked},
//!         cursor::VecCursor,
//!     },
//!     element::{Element, Identified, WayRecord},
//!     history::ElementHistory,
//!     types::Timestamp,
//! };
//!
//! let mut history = ElementHistory::begin(Element::Way(WayRecord {
//!     id: 7,
//!     nodes: vec![1, 2],
//!     geometry: vec![],
//! }));
//! history
//!     .revise(
//!         Timestamp::new(100),
//!         Element::Way(WayRecord { id: 7, nodes: vec![1, 2, 3], geometry: vec![] }),
//!     )
//!     .expect("revise");
//! let (current, deltas) = history.into_parts();
//!
//! let bucket = 42;
//! let current_cursor = VecCursor::new(vec![(bucket, current.id(), current)]);
//! let delta_cursor =
//!     VecCursor::new(deltas.into_iter().map(|d| (bucket, d.value.id(), d)).collect());
//!
//! let mut collector = Collector::new(CollectorConfig::default(), Unchecked);
//! let out = collector
//!     .collect(current_cursor, delta_cursor, Timestamp::new(50))
//!     .expect("collect");
//!
//! // At instant 50 the two-node version was still in force.
//! let winner = &out.attic[&bucket][0];
//! assert_eq!(winner.timestamp, Timestamp::new(100));
//! match &winner.value {
//!     Element::Way(way) => assert_eq!(way.nodes, vec![1, 2]),
//!     other => panic!("unexpected winner: {other:?}"),
//! }
//! assert!(out.current.is_empty());
//! ```
#![deny(missing_docs)]

/// Ordered-sequence delta codec.
pub mod codec;
/// Time-travel collector, cursors, and fault reports.
pub mod collect;
/// Per-kind delta envelopes and their binary layout.
pub mod delta;
/// Composite element records and the closed element set.
pub mod element;
/// Write-time assembly of per-element version chains.
pub mod history;
/// Shared primitive types and the 40-bit timestamp.
pub mod types;
/// Point-in-time decoration for records and deltas.
pub mod versioned;
