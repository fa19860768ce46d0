//! Raw trace line decoding.
//!
//! The collector prints two line shapes, distinguished by field count:
//!
//! ```text
//! entry:  function_name run_id call_id thread_id depth start_time
//! return: function_name run_id call_id total_time
//! ```
//!
//! Each line is decoded once into a [`TraceEvent`] so the tree builder
//! never deals with strings.

use crate::utils::config::{ENTRY_FIELD_COUNT, MAX_TOTAL_TIME, RETURN_FIELD_COUNT};
use crate::utils::error::TraceError;
use anyhow::Context;
use log::debug;
use std::path::Path;
use std::str::FromStr;

/// Function entry, printed when a call is opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryEvent {
    pub function_name: String,
    pub run_id: u64,
    pub call_id: u64,
    pub thread_id: u64,
    pub depth: u32,
    pub start_time: u64,
}

/// Function return, carrying the elapsed time of the matching entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnEvent {
    pub function_name: String,
    pub run_id: u64,
    pub call_id: u64,
    pub total_time: u64,
}

/// One decoded trace line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    Entry(EntryEvent),
    Return(ReturnEvent),
}

impl TraceEvent {
    pub fn run_id(&self) -> u64 {
        match self {
            TraceEvent::Entry(e) => e.run_id,
            TraceEvent::Return(r) => r.run_id,
        }
    }

    pub fn call_id(&self) -> u64 {
        match self {
            TraceEvent::Entry(e) => e.call_id,
            TraceEvent::Return(r) => r.call_id,
        }
    }

    pub fn function_name(&self) -> &str {
        match self {
            TraceEvent::Entry(e) => &e.function_name,
            TraceEvent::Return(r) => &r.function_name,
        }
    }
}

/// Decode a single trace line
///
/// **Public** - used by `parse_trace_text` and tests
///
/// # Arguments
/// * `line` - Raw text of the line
/// * `line_no` - 1-based line number, reported in errors
///
/// # Returns
/// `Ok(None)` for blank lines, otherwise the decoded event
///
/// # Errors
/// * `TraceError::MalformedLine` - wrong field count, a non-numeric field,
///   or a total time above `MAX_TOTAL_TIME`
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<TraceEvent>, TraceError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.is_empty() {
        return Ok(None);
    }

    let malformed = |message: String| TraceError::MalformedLine {
        line: line_no,
        text: line.to_string(),
        message,
    };

    // The root's final return is printed as "name, run call total"
    let function_name = fields[0].strip_suffix(',').unwrap_or(fields[0]);
    if function_name.is_empty() {
        return Err(malformed("empty function name".to_string()));
    }

    let event = match fields.len() {
        ENTRY_FIELD_COUNT => TraceEvent::Entry(EntryEvent {
            function_name: function_name.to_string(),
            run_id: parse_field(fields[1], "run_id").map_err(malformed)?,
            call_id: parse_field(fields[2], "call_id").map_err(malformed)?,
            thread_id: parse_field(fields[3], "thread_id").map_err(malformed)?,
            depth: parse_field(fields[4], "depth").map_err(malformed)?,
            start_time: parse_field(fields[5], "start_time").map_err(malformed)?,
        }),
        RETURN_FIELD_COUNT => {
            let total_time: u64 = parse_field(fields[3], "total_time").map_err(malformed)?;
            if total_time > MAX_TOTAL_TIME {
                return Err(malformed(format!(
                    "total_time {} exceeds {}",
                    total_time, MAX_TOTAL_TIME
                )));
            }
            TraceEvent::Return(ReturnEvent {
                function_name: function_name.to_string(),
                run_id: parse_field(fields[1], "run_id").map_err(malformed)?,
                call_id: parse_field(fields[2], "call_id").map_err(malformed)?,
                total_time,
            })
        }
        n => {
            return Err(malformed(format!(
                "expected {} (entry) or {} (return) fields, found {}",
                ENTRY_FIELD_COUNT, RETURN_FIELD_COUNT, n
            )))
        }
    };

    Ok(Some(event))
}

/// Parse one numeric field, naming it in the error message
///
/// **Private** - internal helper for parse_line
fn parse_field<T: FromStr>(raw: &str, field: &str) -> Result<T, String> {
    raw.parse::<T>()
        .map_err(|_| format!("{} is not an unsigned integer: {:?}", field, raw))
}

/// Decode every line of a collected trace
///
/// **Public** - main entry point for parsing
///
/// # Errors
/// * `TraceError::MalformedLine` - the first line that fails to decode
pub fn parse_trace_text(text: &str) -> Result<Vec<TraceEvent>, TraceError> {
    let mut events = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if let Some(event) = parse_line(line, idx + 1)? {
            events.push(event);
        }
    }

    debug!("Decoded {} trace events", events.len());
    Ok(events)
}

/// Read and decode a trace previously saved to disk
///
/// **Public** - used by the analyze command
pub fn read_trace_file(path: impl AsRef<Path>) -> anyhow::Result<Vec<TraceEvent>> {
    let path = path.as_ref();
    debug!("Reading trace from: {}", path.display());

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read trace file {}", path.display()))?;
    let events = parse_trace_text(&text)
        .with_context(|| format!("Failed to decode trace file {}", path.display()))?;
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entry_line() {
        let event = parse_line("foo 1 0 42 0 1000", 1).unwrap().unwrap();
        assert_eq!(
            event,
            TraceEvent::Entry(EntryEvent {
                function_name: "foo".to_string(),
                run_id: 1,
                call_id: 0,
                thread_id: 42,
                depth: 0,
                start_time: 1000,
            })
        );
    }

    #[test]
    fn test_parse_return_line() {
        let event = parse_line("bar 1 3 250", 7).unwrap().unwrap();
        assert_eq!(
            event,
            TraceEvent::Return(ReturnEvent {
                function_name: "bar".to_string(),
                run_id: 1,
                call_id: 3,
                total_time: 250,
            })
        );
    }

    #[test]
    fn test_trailing_comma_on_root_return() {
        let event = parse_line("foo, 0 0 1234", 1).unwrap().unwrap();
        assert_eq!(event.function_name(), "foo");
        assert_eq!(event.call_id(), 0);
    }

    #[test]
    fn test_blank_line_is_skipped() {
        assert_eq!(parse_line("   ", 3).unwrap(), None);
    }

    #[test]
    fn test_wrong_field_count() {
        let err = parse_line("foo 1 2", 9).unwrap_err();
        match err {
            TraceError::MalformedLine { line, .. } => assert_eq!(line, 9),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_field() {
        let err = parse_line("foo 1 x 42 0 1000", 2).unwrap_err();
        assert!(err.to_string().contains("call_id"));
    }

    #[test]
    fn test_negative_depth_rejected() {
        assert!(parse_line("foo 1 0 42 -1 1000", 1).is_err());
    }

    #[test]
    fn test_total_time_limited_to_signed_range() {
        let max = format!("foo 0 0 {}", i64::MAX);
        assert!(parse_line(&max, 1).is_ok());

        let err = parse_line("foo 0 0 9223372036854775813", 4).unwrap_err();
        match err {
            TraceError::MalformedLine { line, message, .. } => {
                assert_eq!(line, 4);
                assert!(message.contains("total_time"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_trace_text_reports_line_number() {
        let text = "foo 0 0 1 0 10\n\ndtrace: error on enabled probe\nfoo 0 0 5\n";
        let err = parse_trace_text(text).unwrap_err();
        match err {
            TraceError::MalformedLine { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
