// src/config/mod.rs
// =============================================================================
// This module persists the repository and token that `gitme setup` saves.
//
// The file is a tiny JSON object: { "owner": ..., "repo": ..., "token": ... }
// `log` and `contrib` read it, only `setup` writes it.
// =============================================================================

mod store;

pub use store::{ConfigStore, Settings};
