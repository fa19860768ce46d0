//! Trace line decoding.
//!
//! This module handles:
//! - Splitting raw collector output into typed entry/return events
//! - Reporting malformed lines with their line numbers

pub mod event;

// Re-export main types
pub use event::{parse_line, parse_trace_text, read_trace_file, EntryEvent, ReturnEvent, TraceEvent};
