//! Discord interaction handlers
//!
//! This module provides handlers for Discord events that are not prefix commands:
//! free-text replies to pending prompts and button clicks.

/// Message and component interaction handlers
pub mod events;

pub use events::event_handler;
