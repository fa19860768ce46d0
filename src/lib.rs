//! Topo Trace
//!
//! Rebuilds per-run call trees from DTrace function-boundary traces and
//! aggregates per-function timing statistics across runs.
//!
//! ## Getting Started
//!
//! Most users should install and use the CLI:
//!
//! ```bash
//! cargo install topo-trace
//! topo collect vn_open -n 5
//! ```
//!
//! The library can also aggregate a trace that was collected elsewhere:
//!
//! ```
//! use topo_trace::aggregator::{aggregate, AggregateOptions};
//! use topo_trace::parser::parse_trace_text;
//!
//! let events = parse_trace_text("foo 1 0 9 0 0\nbar 1 1 9 1 1\nbar 1 1 2\nfoo 1 0 5\n")?;
//! let stats = aggregate(events, AggregateOptions::default())?;
//! assert_eq!(stats[0].name, "foo");
//! assert_eq!(stats[0].contrib_time, 3);
//! # Ok::<(), topo_trace::utils::TraceError>(())
//! ```

pub mod aggregator;
pub mod collector;
pub mod commands;
pub mod output;
pub mod parser;
pub mod utils;
