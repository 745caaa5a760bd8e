// src/pager/mod.rs
// =============================================================================
// This module streams gitme's output into a terminal pager (less by default).
//
// Pieces:
// - OutputSink: the handle producers push text blocks into
// - Pager: owns the pager process plus the background task that copies
//   blocks from the sink into the pager's stdin
// - PagerCommand: which program to run ($GITME_PAGER, $PAGER, `less -R`)
//
// When paging is off (--no-pager, or stdout isn't a terminal) the same
// OutputSink/Pager pair writes straight to stdout instead.
// =============================================================================

mod sink;

pub use sink::{open, OutputMode, OutputSink, PagerCommand};
