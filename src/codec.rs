//! Ordered-sequence delta codec.
//!
//! [`compute_delta`] finds the maximal common prefix between a reference and
//! a target sequence, then the maximal common suffix of the remainder, and
//! emits everything in between as one removed run (reference positions) and
//! one added run (target positions with values). This is O(n) and trades a
//! truly minimal diff for a cheap deterministic approximation that matches
//! the dominant edit shape in map data: a small local splice.
//!
//! [`apply_delta`] is the fast-path strategy and falls back to the general
//! merge scan, [`apply_delta_scan`], whenever the script's shape cannot be
//! verified.

use serde::{Deserialize, Serialize};

/// Edit script between two ordered sequences.
///
/// `removed` holds reference positions in ascending order; `added` holds
/// `(target position, value)` pairs in ascending position order. Applying
/// both against the reference sequence reproduces the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeqDelta<T> {
    /// Reference positions to drop, ascending.
    pub removed: Vec<u32>,
    /// Target positions and values to insert, ascending.
    pub added: Vec<(u32, T)>,
}

impl<T> SeqDelta<T> {
    /// True when the script changes nothing.
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

impl<T> Default for SeqDelta<T> {
    fn default() -> Self {
        Self {
            removed: Vec::new(),
            added: Vec::new(),
        }
    }
}

/// Computes the edit script that turns `reference` into `target`.
///
/// Degenerates to an empty script for identical sequences, a pure-insertion
/// script when `reference` is a prefix+suffix of `target`, and a
/// pure-deletion script in the mirrored case.
pub fn compute_delta<T: Eq + Clone>(target: &[T], reference: &[T]) -> SeqDelta<T> {
    let shorter = reference.len().min(target.len());

    let mut prefix = 0;
    while prefix < shorter && reference[prefix] == target[prefix] {
        prefix += 1;
    }

    // The suffix may not reach back into the prefix range.
    let mut suffix = 0;
    while suffix < shorter - prefix
        && reference[reference.len() - 1 - suffix] == target[target.len() - 1 - suffix]
    {
        suffix += 1;
    }

    let removed = (prefix..reference.len() - suffix)
        .map(|index| index as u32)
        .collect();
    let added = (prefix..target.len() - suffix)
        .map(|index| (index as u32, target[index].clone()))
        .collect();

    SeqDelta { removed, added }
}

/// Applies `delta` to an owned `reference`, preferring the cheap strategies.
///
/// In order: unchanged scripts hand the reference back without copying;
/// scripts whose removed and added lists cover the identical contiguous
/// position range overwrite in place; scripts with one contiguous removed
/// run and one contiguous added run are applied as a single splice. Scripts
/// produced by [`compute_delta`] always satisfy the splice shape, but it is
/// verified here and any violation falls back to [`apply_delta_scan`].
pub fn apply_delta<T: Clone>(mut reference: Vec<T>, delta: &SeqDelta<T>) -> Vec<T> {
    if delta.is_empty() {
        return reference;
    }

    let removed_run = contiguous_run(&delta.removed);
    let added_run = contiguous_added_run(&delta.added);

    if let (Some((rem_start, rem_end)), Some((add_start, add_end))) = (removed_run, added_run) {
        if rem_start == add_start && rem_end == add_end && (rem_end as usize) <= reference.len() {
            for (position, value) in &delta.added {
                reference[*position as usize] = value.clone();
            }
            return reference;
        }
    }

    if let Some(spliced) = apply_splice(&reference, delta, removed_run, added_run) {
        return spliced;
    }

    apply_delta_scan(&reference, delta)
}

/// Applies `delta` with the general merge-scan strategy.
///
/// Walks the reference once, splicing in added entries whenever their
/// position matches the output length, skipping removed reference positions,
/// and flushing trailing added entries after the scan.
pub fn apply_delta_scan<T: Clone>(reference: &[T], delta: &SeqDelta<T>) -> Vec<T> {
    let mut out = Vec::with_capacity(reference.len() + delta.added.len());
    let mut added = delta.added.iter().peekable();
    let mut removed = delta.removed.iter().peekable();

    for (index, value) in reference.iter().enumerate() {
        while added
            .peek()
            .is_some_and(|(position, _)| *position as usize == out.len())
        {
            if let Some((_, insert)) = added.next() {
                out.push(insert.clone());
            }
        }

        if removed.peek().is_some_and(|&&position| position as usize == index) {
            removed.next();
            continue;
        }

        out.push(value.clone());
    }

    for (_, insert) in added {
        out.push(insert.clone());
    }

    out
}

/// Single-splice application. `None` when the script shape does not permit
/// it and the caller must use the general scan.
fn apply_splice<T: Clone>(
    reference: &[T],
    delta: &SeqDelta<T>,
    removed_run: Option<(u32, u32)>,
    added_run: Option<(u32, u32)>,
) -> Option<Vec<T>> {
    let (removed_run, added_run) = (removed_run?, added_run?);

    let (cut_start, cut_end) = if delta.removed.is_empty() {
        // Pure insertion: splice at the added run's start.
        let at = added_run.0 as usize;
        (at, at)
    } else {
        (removed_run.0 as usize, removed_run.1 as usize)
    };

    if !delta.removed.is_empty() && !delta.added.is_empty() && removed_run.0 != added_run.0 {
        return None;
    }
    if cut_start > reference.len() || cut_end > reference.len() {
        return None;
    }

    let mut out =
        Vec::with_capacity(reference.len() - (cut_end - cut_start) + delta.added.len());
    out.extend_from_slice(&reference[..cut_start]);
    out.extend(delta.added.iter().map(|(_, value)| value.clone()));
    out.extend_from_slice(&reference[cut_end..]);
    Some(out)
}

/// Half-open `(start, end)` of a contiguous ascending run, `None` when the
/// positions have gaps. Empty lists count as the degenerate run.
fn contiguous_run(positions: &[u32]) -> Option<(u32, u32)> {
    let (first, last) = match (positions.first(), positions.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return Some((0, 0)),
    };
    if positions
        .windows(2)
        .all(|pair| pair[1] == pair[0].saturating_add(1))
    {
        Some((first, last.saturating_add(1)))
    } else {
        None
    }
}

fn contiguous_added_run<T>(added: &[(u32, T)]) -> Option<(u32, u32)> {
    let (first, last) = match (added.first(), added.last()) {
        (Some((first, _)), Some((last, _))) => (*first, *last),
        _ => return Some((0, 0)),
    };
    if added
        .windows(2)
        .all(|pair| pair[1].0 == pair[0].0.saturating_add(1))
    {
        Some((first, last.saturating_add(1)))
    } else {
        None
    }
}
