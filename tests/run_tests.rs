//! End-to-end runs: split, dispatch, merge, stats and cleanup through `splitrun::run`.
#![cfg(unix)]

use splitrun::{
    ArgTemplate, DEFAULT_BOUNDARY, InputSource, MergeStrategy, OutputKind, RunConfig, RunError, run,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn config_for(tmp: &TempDir, content: &str, program: &str, args: Vec<&str>) -> RunConfig {
    let input = tmp.path().join("input.txt");
    fs::write(&input, content).unwrap();
    let mut config = RunConfig::new(
        InputSource::Pattern {
            file: input,
            boundary: DEFAULT_BOUNDARY.to_string(),
        },
        tmp.path().join("merged.txt"),
        program,
    );
    config.args = ArgTemplate::Template(args.into_iter().map(String::from).collect());
    config.staging_root = Some(staging(tmp));
    config.workers = 2;
    config
}

fn staging(tmp: &TempDir) -> PathBuf {
    tmp.path().join("staging")
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_copy_program_round_trips_input() {
    let tmp = TempDir::new().unwrap();
    let content = "a\nb\nc\nd\ne\n";
    let mut config = config_for(&tmp, content, "cp", vec!["{in}", "{out}"]);
    let stats_path = tmp.path().join("stats.csv");
    config.stats = Some(stats_path.clone());

    let report = run(&config).unwrap();
    assert_eq!(report.chunk_count, 5);
    assert_eq!(report.processed(), 5);
    assert!(report.failures.is_empty());
    assert_eq!(report.merged.as_deref(), Some(config.output.as_path()));
    assert_eq!(read(&config.output), content);
    assert!(!staging(&tmp).exists(), "staging root removed after run");

    assert_eq!(report.stats.as_deref(), Some(stats_path.as_path()));
    let stats = read(&stats_path);
    let (worker_table, chunk_table) = stats.split_once("\n\n").unwrap();
    let worker_rows: Vec<&str> = worker_table.lines().skip(1).collect();
    assert_eq!(worker_rows.len(), 2);
    let processed: usize = worker_rows
        .iter()
        .map(|row| row.split(',').nth(2).unwrap().parse::<usize>().unwrap())
        .sum();
    assert_eq!(processed, 5);
    assert_eq!(chunk_table.lines().skip(1).count(), 5);
    for row in chunk_table.lines().skip(1) {
        assert_eq!(row.split(',').nth(1), Some("2"));
    }
}

#[test]
fn test_stats_write_failure_keeps_merged_output() {
    let tmp = TempDir::new().unwrap();
    let content = "a\nb\nc\n";
    let mut config = config_for(&tmp, content, "cp", vec!["{in}", "{out}"]);
    let stats_path = tmp.path().join("no_such_dir").join("stats.csv");
    config.stats = Some(stats_path.clone());

    let report = run(&config).unwrap();
    assert_eq!(report.stats, None);
    assert!(!stats_path.exists());
    assert_eq!(report.merged.as_deref(), Some(config.output.as_path()));
    assert_eq!(read(&config.output), content);
    assert!(report.failures.is_empty());
    assert!(!staging(&tmp).exists());
}

#[test]
fn test_header_lines_kept_once() {
    let tmp = TempDir::new().unwrap();
    let mut config = config_for(
        &tmp,
        "x\ny\nz\n",
        "sh",
        vec!["-c", "{ echo HEADER; cat {in}; } > {out}"],
    );
    config.header_lines = 1;

    let report = run(&config).unwrap();
    assert!(report.failures.is_empty());
    assert_eq!(read(&config.output), "HEADER\nx\ny\nz\n");
}

#[test]
fn test_merge_follows_split_order_not_completion_order() {
    let tmp = TempDir::new().unwrap();
    let content = "0.3\n0.0\n0.2\n0.1\n";
    let mut config = config_for(
        &tmp,
        content,
        "sh",
        vec!["-c", "sleep $(cat {in}); cp {in} {out}"],
    );
    config.workers = 4;

    let report = run(&config).unwrap();
    assert_eq!(report.processed(), 4);
    assert_eq!(read(&config.output), content);
}

#[test]
fn test_redirect_template_with_filter_program() {
    let tmp = TempDir::new().unwrap();
    let mut config = config_for(&tmp, "ab\ncd\n", "rev", vec![]);
    config.args = ArgTemplate::Redirect;

    let report = run(&config).unwrap();
    assert!(report.failures.is_empty());
    assert_eq!(read(&config.output), "ba\ndc\n");
}

#[test]
fn test_failed_invocations_are_reported_not_fatal() {
    let tmp = TempDir::new().unwrap();
    let config = config_for(&tmp, "a\nb\n", "/definitely/not/a/program", vec!["{in}"]);

    let report = run(&config).unwrap();
    assert_eq!(report.processed(), 2);
    let failed: Vec<usize> = report.failures.iter().map(|f| f.ordinal).collect();
    assert_eq!(failed, vec![0, 1]);
    assert_eq!(read(&config.output), "");
    assert!(!staging(&tmp).exists());
}

#[test]
fn test_missing_input_fails_before_dispatch() {
    let tmp = TempDir::new().unwrap();
    let mut config = config_for(&tmp, "a\n", "cp", vec!["{in}", "{out}"]);
    config.input = InputSource::Pattern {
        file: tmp.path().join("absent.txt"),
        boundary: DEFAULT_BOUNDARY.to_string(),
    };

    let err = run(&config).unwrap_err();
    assert!(matches!(err, RunError::SourceRead { .. }));
    assert!(!config.output.exists());
}

#[test]
fn test_zero_workers_rejected() {
    let tmp = TempDir::new().unwrap();
    let mut config = config_for(&tmp, "a\n", "cp", vec!["{in}", "{out}"]);
    config.workers = 0;
    assert!(matches!(run(&config).unwrap_err(), RunError::Config(_)));
    assert!(!staging(&tmp).exists());
}

#[test]
fn test_directory_output_needs_non_default_merge() {
    let tmp = TempDir::new().unwrap();
    let mut config = config_for(&tmp, "a\n", "cp", vec!["{in}", "{out}/copy"]);
    config.output_kind = OutputKind::Directory;
    assert!(matches!(config.validate(), Err(RunError::Config(_))));

    config.merge = MergeStrategy::ExternalProgram {
        program: "sh".into(),
        args: vec![
            "-c".into(),
            "dest=$1; shift; for d in \"$@\"; do cat \"$d/copy\"; done > \"$dest\"".into(),
            "merge".into(),
            "{out}".into(),
        ],
    };
    let report = run(&config).unwrap();
    assert!(report.failures.is_empty());
    assert_eq!(read(&config.output), "a\n");
}

#[test]
fn test_keep_staging_leaves_chunk_dirs() {
    let tmp = TempDir::new().unwrap();
    let mut config = config_for(&tmp, "a\nb\n", "cp", vec!["{in}", "{out}"]);
    config.keep_staging = true;

    run(&config).unwrap();
    let dirs: Vec<PathBuf> = fs::read_dir(staging(&tmp))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(dirs.len(), 2);
    for d in dirs {
        assert!(d.join("in").is_file());
        assert!(d.join("out").is_file());
    }
}

#[test]
fn test_presplit_directory_run() {
    let tmp = TempDir::new().unwrap();
    let parts = tmp.path().join("parts");
    fs::create_dir(&parts).unwrap();
    fs::write(parts.join("02.txt"), "second\n").unwrap();
    fs::write(parts.join("01.txt"), "first\n").unwrap();
    let mut config = config_for(&tmp, "", "cp", vec!["{in}", "{out}"]);
    config.input = InputSource::PreSplit { dir: parts };

    let report = run(&config).unwrap();
    assert_eq!(report.chunk_count, 2);
    assert_eq!(read(&config.output), "first\nsecond\n");
}
