//! Public and internal types for the splitrun API and pipeline.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::chunk::Chunk;
use crate::error::RunError;
use crate::utils::config::{PackagePaths, WorkerThreadLimits};

/// Boundary pattern used when none is configured: every line closes a chunk.
pub const DEFAULT_BOUNDARY: &str = ".*";

/// Where chunks come from.
#[derive(Clone, Debug)]
pub enum InputSource {
    /// One file split into chunks; a line fully matching `boundary` closes the current chunk.
    Pattern { file: PathBuf, boundary: String },
    /// Every regular file directly inside `dir` is one chunk (sorted by file name).
    PreSplit { dir: PathBuf },
}

impl InputSource {
    /// Path of the file or directory the chunks are read from.
    pub fn path(&self) -> &Path {
        match self {
            InputSource::Pattern { file, .. } => file,
            InputSource::PreSplit { dir } => dir,
        }
    }
}

/// Kind of artifact the external program writes at each chunk's `out` path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputKind {
    #[default]
    File,
    Directory,
}

/// How the chunk's input/output paths reach the external program.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ArgTemplate {
    /// stdin is read from `in`, stdout is written to `out`.
    #[default]
    Redirect,
    /// `[in_flag, in, out_flag, out]`. A missing flag falls back to redirection for that side.
    Flags {
        in_flag: Option<String>,
        out_flag: Option<String>,
    },
    /// Literal arguments; every `{in}` / `{out}` substring is replaced by the absolute path.
    Template(Vec<String>),
}

impl ArgTemplate {
    pub const IN_PLACEHOLDER: &'static str = "{in}";
    pub const OUT_PLACEHOLDER: &'static str = "{out}";

    /// True when the child's stdout is the chunk's output artifact.
    pub fn redirects_stdout(&self) -> bool {
        match self {
            ArgTemplate::Redirect => true,
            ArgTemplate::Flags { out_flag, .. } => out_flag.is_none(),
            ArgTemplate::Template(_) => false,
        }
    }

    /// True when the child's stdin is the chunk's input artifact.
    pub fn redirects_stdin(&self) -> bool {
        match self {
            ArgTemplate::Redirect => true,
            ArgTemplate::Flags { in_flag, .. } => in_flag.is_none(),
            ArgTemplate::Template(_) => false,
        }
    }
}

/// User-supplied merge: receives the chunks in split order and the destination path.
pub type MergeFn = dyn Fn(&[Arc<Chunk>], &Path) -> anyhow::Result<()> + Send + Sync;

/// Strategy used to reassemble chunk outputs, chosen once at configuration time.
#[derive(Clone, Default)]
pub enum MergeStrategy {
    /// Header of the first chunk, then every chunk's post-header lines in split order.
    #[default]
    ConcatenateWithHeader,
    /// Library callers hand in their own merge.
    UserSupplied(Arc<MergeFn>),
    /// Run `program args...` followed by every chunk's output path in split order.
    /// `{out}` in `args` is replaced by the destination.
    ExternalProgram { program: PathBuf, args: Vec<String> },
}

impl MergeStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            MergeStrategy::ConcatenateWithHeader => "default",
            MergeStrategy::UserSupplied(_) => "custom",
            MergeStrategy::ExternalProgram { .. } => "external",
        }
    }
}

impl fmt::Debug for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeStrategy::ConcatenateWithHeader => f.write_str("ConcatenateWithHeader"),
            MergeStrategy::UserSupplied(_) => f.write_str("UserSupplied(<fn>)"),
            MergeStrategy::ExternalProgram { program, args } => f
                .debug_struct("ExternalProgram")
                .field("program", program)
                .field("args", args)
                .finish(),
        }
    }
}

/// Fully-populated run configuration. Built by the CLI (flags + config file) or by library callers.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub input: InputSource,
    /// Merged output destination.
    pub output: PathBuf,
    /// External program invoked once per chunk.
    pub executable: PathBuf,
    pub args: ArgTemplate,
    pub workers: usize,
    /// Lines at the top of each chunk output treated as header (kept once, from the first chunk).
    pub header_lines: usize,
    pub output_kind: OutputKind,
    pub merge: MergeStrategy,
    /// Write per-worker and per-chunk statistics here when set.
    pub stats: Option<PathBuf>,
    /// Parent of the per-chunk staging directories. When None, `<output parent>/.splitrun_staging`.
    pub staging_root: Option<PathBuf>,
    /// Leave staging directories on disk after the run.
    pub keep_staging: bool,
    /// Emit trailing lines that never matched the boundary as a final chunk instead of dropping them.
    pub flush_trailing: bool,
    /// Show a progress bar.
    pub verbose: bool,
}

impl RunConfig {
    /// Config with defaults for everything except the input, output and program.
    pub fn new(input: InputSource, output: impl Into<PathBuf>, executable: impl Into<PathBuf>) -> Self {
        RunConfig {
            input,
            output: output.into(),
            executable: executable.into(),
            args: ArgTemplate::default(),
            workers: WorkerThreadLimits::current().default_workers(),
            header_lines: 0,
            output_kind: OutputKind::default(),
            merge: MergeStrategy::default(),
            stats: None,
            staging_root: None,
            keep_staging: false,
            flush_trailing: false,
            verbose: false,
        }
    }

    /// Staging root, defaulting next to the merged output.
    pub fn staging_root(&self) -> PathBuf {
        self.staging_root.clone().unwrap_or_else(|| {
            self.output
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."))
                .join(PackagePaths::get().staging_dir_name())
        })
    }

    /// Reject combinations the pipeline cannot honour.
    pub fn validate(&self) -> Result<(), RunError> {
        if self.workers == 0 {
            return Err(RunError::Config("worker count must be at least 1".into()));
        }
        if self.executable.as_os_str().is_empty() {
            return Err(RunError::Config("no executable configured".into()));
        }
        if self.output.as_os_str().is_empty() {
            return Err(RunError::Config("no output destination configured".into()));
        }
        if self.output_kind == OutputKind::Directory {
            if self.args.redirects_stdout() {
                return Err(RunError::Config(
                    "directory output needs an output flag or {out} placeholder; stdout cannot write a directory"
                        .into(),
                ));
            }
            if matches!(self.merge, MergeStrategy::ConcatenateWithHeader) {
                return Err(RunError::Config(
                    "default merge concatenates files; use a custom or external merge for directory output"
                        .into(),
                ));
            }
        }
        Ok(())
    }
}

/// Aggregate for one worker after the barrier join.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub id: usize,
    /// Total wall-clock time spent inside external invocations.
    pub busy_ms: u64,
    pub processed: usize,
}

impl WorkerStats {
    /// Average milliseconds per chunk; 0 when nothing was processed.
    pub fn avg_ms(&self) -> u64 {
        if self.processed == 0 {
            0
        } else {
            self.busy_ms / self.processed as u64
        }
    }
}

/// A chunk whose contribution may be missing from the merged output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkFailure {
    pub ordinal: usize,
    pub id: String,
    pub reason: String,
}

/// What a run produced.
#[derive(Debug, Default)]
pub struct RunReport {
    pub chunk_count: usize,
    pub workers: Vec<WorkerStats>,
    /// Per-chunk invocation failures and missing outputs, in split order.
    pub failures: Vec<ChunkFailure>,
    /// Merged output path, or None when the merge phase failed.
    pub merged: Option<PathBuf>,
    /// Stats file path, or None when not requested or the write failed.
    pub stats: Option<PathBuf>,
}

impl RunReport {
    /// Sum of all workers' processed counts.
    pub fn processed(&self) -> usize {
        self.workers.iter().map(|w| w.processed).sum()
    }
}
