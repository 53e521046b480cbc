//! Tracing hooks for buffering operators.

#[cfg(feature = "tracing")]
pub fn record_drain(op: &'static str, rows: usize) {
    tracing::debug!(op, rows, "drained source");
}

#[cfg(not(feature = "tracing"))]
pub fn record_drain(_op: &'static str, _rows: usize) { /* no-op */
}

#[cfg(feature = "tracing")]
pub fn record_source_switch(op: &'static str, index: usize) {
    tracing::debug!(op, index, "starting source");
}

#[cfg(not(feature = "tracing"))]
pub fn record_source_switch(_op: &'static str, _index: usize) { /* no-op */
}

#[cfg(feature = "tracing")]
pub fn record_lookup(op: &'static str, groups: usize, rows: usize) {
    tracing::debug!(op, groups, rows, "built lookup");
}

#[cfg(not(feature = "tracing"))]
pub fn record_lookup(_op: &'static str, _groups: usize, _rows: usize) { /* no-op */
}
