// src/history/mod.rs
// =============================================================================
// Commit history: fetch, aggregate, and render commits page by page.
//
// Submodules:
// - pipeline: the per-page concurrent fetch and the pagination loop
// - render: text formatting for commits and contributors
// =============================================================================

mod pipeline;
mod render;

pub use pipeline::{stream_history, HistoryOutcome, LogRequest, DEFAULT_PAGE_SIZE};
pub use render::render_contributor;
