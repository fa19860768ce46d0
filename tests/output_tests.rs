use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use topo_trace::aggregator::FuncStats;
use topo_trace::output::{read_stats, validate_path, write_stats};
use topo_trace::utils::ParseError;

fn create_test_stats() -> Vec<FuncStats> {
    vec![
        FuncStats {
            name: "open".to_string(),
            total_time: 110,
            contrib_time: 50,
            depths: vec![0, 0],
            call_count: 2,
            callers: BTreeSet::new(),
            callees: ["alloc", "lookup"].iter().map(|s| s.to_string()).collect(),
        },
        FuncStats {
            name: "lookup".to_string(),
            total_time: 50,
            contrib_time: -3,
            depths: vec![1, 1],
            call_count: 2,
            callers: ["open".to_string()].into_iter().collect(),
            callees: BTreeSet::new(),
        },
    ]
}

#[test]
fn test_write_and_read_stats() {
    let stats = create_test_stats();
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path();

    write_stats(&stats, path).unwrap();
    let loaded = read_stats(path).unwrap();

    assert_eq!(loaded, stats);
}

#[test]
fn test_one_record_per_line() {
    let temp_file = NamedTempFile::new().unwrap();
    write_stats(&create_test_stats(), temp_file.path()).unwrap();

    let contents = std::fs::read_to_string(temp_file.path()).unwrap();
    assert_eq!(contents.lines().count(), 2);
    assert!(contents.lines().all(|l| l.starts_with("{\"name\":")));
}

#[test]
fn test_read_reports_bad_line_number() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let good = topo_trace::output::to_machine_line(&create_test_stats()[0]).unwrap();
    writeln!(temp_file, "{}", good).unwrap();
    writeln!(temp_file).unwrap();
    writeln!(temp_file, "FuncStats(open, 110, 50, [0, 0], 2, [], [])").unwrap();
    temp_file.flush().unwrap();

    let err = read_stats(temp_file.path()).unwrap_err();
    assert!(matches!(err, ParseError::InvalidRecord { line: 3, .. }));
}

#[test]
fn test_read_missing_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let err = read_stats(temp_dir.path().join("missing.stats")).unwrap_err();
    assert!(matches!(err, ParseError::Io(_)));
}

#[test]
fn test_validate_output_path_empty() {
    let result = validate_path(Path::new(""));
    assert!(result.is_err());
}

#[test]
fn test_validate_output_path_directory() {
    let temp_dir = tempfile::tempdir().unwrap();
    let result = validate_path(temp_dir.path());
    assert!(result.is_err());
}

#[test]
fn test_write_creates_parent_dirs() {
    let temp_dir = tempfile::tempdir().unwrap();
    let nested_path = temp_dir.path().join("nested/dirs/open.stats");

    write_stats(&create_test_stats(), &nested_path).unwrap();

    assert!(nested_path.exists());
}
