//! Worker pool tests: every chunk processed once, failures isolated, barrier before return.
#![cfg(unix)]

use splitrun::engine::Invocation;
use splitrun::pipeline::{ChunkList, DispatchQueue, Splitter, WorkerPool};
use splitrun::{ArgTemplate, DEFAULT_BOUNDARY, InputSource, OutputKind};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn split_lines(tmp: &TempDir, lines: &[&str]) -> ChunkList {
    let input = tmp.path().join("input.txt");
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(&input, content).unwrap();
    Splitter::new(tmp.path().join("staging"))
        .split(&InputSource::Pattern {
            file: input,
            boundary: DEFAULT_BOUNDARY.to_string(),
        })
        .unwrap()
}

fn invocation(program: &str, template: ArgTemplate) -> Invocation {
    Invocation {
        program: PathBuf::from(program),
        template,
        output_kind: OutputKind::File,
    }
}

fn copy_template() -> ArgTemplate {
    ArgTemplate::Template(vec!["{in}".into(), "{out}".into()])
}

#[test]
fn test_processed_counts_sum_to_chunk_count() {
    let tmp = TempDir::new().unwrap();
    let lines: Vec<String> = (0..17).map(|i| format!("row {i}")).collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let chunks = split_lines(&tmp, &refs);

    for workers in [1, 3, 8] {
        let pool = WorkerPool::new(workers, invocation("cp", copy_template()));
        let outcome = pool.run(DispatchQueue::from_chunks(&chunks));
        assert_eq!(outcome.workers.len(), workers);
        assert_eq!(outcome.processed(), chunks.len());
        assert!(outcome.failures.is_empty());
        let ids: Vec<usize> = outcome.workers.iter().map(|w| w.id).collect();
        assert_eq!(ids, (0..workers).collect::<Vec<_>>());
        for c in &chunks {
            assert!(c.is_processed());
            assert_eq!(fs::read_to_string(c.out_path()).unwrap(), fs::read_to_string(c.in_path()).unwrap());
            c.clean().unwrap();
            fs::create_dir_all(c.dir()).unwrap();
            fs::write(c.in_path(), format!("row {}\n", c.ordinal())).unwrap();
        }
    }
}

#[test]
fn test_more_workers_than_chunks() {
    let tmp = TempDir::new().unwrap();
    let chunks = split_lines(&tmp, &["only", "two"]);
    let outcome = WorkerPool::new(6, invocation("cp", copy_template()))
        .run(DispatchQueue::from_chunks(&chunks));
    assert_eq!(outcome.workers.len(), 6);
    assert_eq!(outcome.processed(), 2);
    let idle = outcome.workers.iter().filter(|w| w.processed == 0).count();
    assert_eq!(idle, 4);
    assert!(outcome.workers.iter().filter(|w| w.processed == 0).all(|w| w.avg_ms() == 0));
}

#[test]
fn test_empty_queue_finishes_immediately() {
    let outcome = WorkerPool::new(3, invocation("cp", copy_template()))
        .run(DispatchQueue::from_chunks(&[]));
    assert_eq!(outcome.workers.len(), 3);
    assert_eq!(outcome.processed(), 0);
}

#[test]
fn test_redirect_feeds_stdin_and_captures_stdout() {
    let tmp = TempDir::new().unwrap();
    let chunks = split_lines(&tmp, &["hello", "world"]);
    let outcome = WorkerPool::new(2, invocation("cat", ArgTemplate::Redirect))
        .run(DispatchQueue::from_chunks(&chunks));
    assert_eq!(outcome.processed(), 2);
    assert_eq!(fs::read_to_string(chunks[0].out_path()).unwrap(), "hello\n");
    assert_eq!(fs::read_to_string(chunks[1].out_path()).unwrap(), "world\n");
}

#[test]
fn test_missing_program_fails_every_chunk_but_pool_completes() {
    let tmp = TempDir::new().unwrap();
    let chunks = split_lines(&tmp, &["a", "b", "c", "d"]);
    let outcome = WorkerPool::new(
        2,
        invocation("/definitely/not/a/program", ArgTemplate::Redirect),
    )
    .run(DispatchQueue::from_chunks(&chunks));

    assert_eq!(outcome.processed(), 4);
    let failed: Vec<usize> = outcome.failures.iter().map(|f| f.ordinal).collect();
    assert_eq!(failed, vec![0, 1, 2, 3]);
    assert!(chunks.iter().all(|c| c.is_processed()));
}

#[test]
fn test_nonzero_exit_is_not_a_failure() {
    let tmp = TempDir::new().unwrap();
    let chunks = split_lines(&tmp, &["a"]);
    let outcome = WorkerPool::new(
        1,
        invocation(
            "sh",
            ArgTemplate::Template(vec!["-c".into(), "cp {in} {out}; exit 3".into()]),
        ),
    )
    .run(DispatchQueue::from_chunks(&chunks));
    assert!(outcome.failures.is_empty());
    assert_eq!(fs::read_to_string(chunks[0].out_path()).unwrap(), "a\n");
}

#[test]
fn test_runtime_recorded_once() {
    let tmp = TempDir::new().unwrap();
    let chunks = split_lines(&tmp, &["a"]);
    WorkerPool::new(
        1,
        invocation(
            "sh",
            ArgTemplate::Template(vec!["-c".into(), "sleep 0.05; cp {in} {out}".into()]),
        ),
    )
    .run(DispatchQueue::from_chunks(&chunks));
    let first = chunks[0].runtime_ms();
    assert!(chunks[0].is_processed());
    assert!(first >= 40, "runtime {first} ms should cover the sleep");
    assert!(!chunks[0].record_runtime(1));
    assert_eq!(chunks[0].runtime_ms(), first);
}

#[test]
fn test_directory_output_is_created_before_launch() {
    let tmp = TempDir::new().unwrap();
    let chunks = split_lines(&tmp, &["x", "y"]);
    let inv = Invocation {
        program: PathBuf::from("cp"),
        template: ArgTemplate::Template(vec!["{in}".into(), "{out}/copy".into()]),
        output_kind: OutputKind::Directory,
    };
    let outcome = WorkerPool::new(2, inv).run(DispatchQueue::from_chunks(&chunks));
    assert!(outcome.failures.is_empty());
    for c in &chunks {
        assert!(c.out_path().is_dir());
        assert!(c.out_path().join("copy").is_file());
    }
}
