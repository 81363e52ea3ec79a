//! Block - versioned document side-panel sessions
//!
//! A chat view opens documents in a side block. Each open document is a
//! session actor that browses the document's version history and saves
//! edits through a debounced, serialized save pipeline.

pub mod actors;
pub mod chat;
pub mod config;
pub mod navigator;
pub mod save_tracker;
pub mod store;
pub mod view;
