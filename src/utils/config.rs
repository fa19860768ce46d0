//! Configuration and constants for the CLI.

/// Fields on an entry line: `name run_id call_id thread_id depth start_time`
pub const ENTRY_FIELD_COUNT: usize = 6;

/// Fields on a return line: `name run_id call_id total_time`
pub const RETURN_FIELD_COUNT: usize = 4;

/// Largest elapsed time accepted on a return line; contrib time is signed
pub const MAX_TOTAL_TIME: u64 = i64::MAX as u64;

/// Call id assigned to the traced top-level function of every run
pub const ROOT_CALL_ID: u64 = 0;

/// Where DTrace lives on the systems we support
pub const DEFAULT_DTRACE_PATH: &str = "/usr/sbin/dtrace";

/// Environment variable overriding the DTrace binary
pub const DTRACE_PATH_ENV: &str = "TOPO_DTRACE";

/// Number of completed runs to collect when none is given
pub const DEFAULT_NUM_RUNS: u32 = 1;

// Characters allowed in function and module names spliced into the D script
pub const PROBE_NAME_EXTRA_CHARS: &[char] = &['_', '.', '$'];
