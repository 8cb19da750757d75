//! Time-travel collection over bucketed current and historical streams.

/// Collector, config, health probing, and output maps.
pub mod collector;
/// Ordered input cursor seam and in-memory implementation.
pub mod cursor;
/// Recoverable per-record fault reports.
pub mod fault;
