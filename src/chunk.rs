//! Chunk: one unit of split input plus its staging directory.
//!
//! A chunk owns `<staging_root>/<ordinal:06>-<id>/` holding `in` (raw chunk text) and, once a
//! worker has run, `out` (file or directory). Runtime is recorded once by the worker that
//! processed it; everything else is fixed at split time.

use log::{debug, warn};
use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::OutputKind;
use crate::engine::tools::{copy_lines_after, take_lines};
use crate::error::RunError;
use crate::utils::config::StagingNames;

#[derive(Debug)]
pub struct Chunk {
    ordinal: usize,
    id: String,
    dir: PathBuf,
    len: u64,
    runtime_ms: AtomicU64,
    recorded: AtomicBool,
}

impl Chunk {
    /// Create the staging directory for `ordinal` and write `content` as its input artifact.
    pub(crate) fn from_content(
        ordinal: usize,
        id: String,
        staging_root: &Path,
        content: &[u8],
    ) -> Result<Self, RunError> {
        let dir = claim_staging_dir(ordinal, &id, staging_root)?;
        let staged = fs::write(dir.join(StagingNames::INPUT), content);
        staged.map_err(|source| RunError::Staging {
            ordinal,
            dir: dir.clone(),
            source,
        })?;
        Ok(Self::new(ordinal, id, dir, content.len() as u64))
    }

    /// Create the staging directory for `ordinal` and copy `src` in as its input artifact.
    /// The chunk's identity is the source file name.
    pub(crate) fn from_file(ordinal: usize, staging_root: &Path, src: &Path) -> Result<Self, RunError> {
        let id = src
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("chunk{ordinal}"));
        let dir = claim_staging_dir(ordinal, &id, staging_root)?;
        let len = fs::copy(src, dir.join(StagingNames::INPUT)).map_err(|source| {
            RunError::Staging {
                ordinal,
                dir: dir.clone(),
                source,
            }
        })?;
        Ok(Self::new(ordinal, id, dir, len))
    }

    fn new(ordinal: usize, id: String, dir: PathBuf, len: u64) -> Self {
        Chunk {
            ordinal,
            id,
            dir,
            len,
            runtime_ms: AtomicU64::new(0),
            recorded: AtomicBool::new(false),
        }
    }

    /// Position in the original split sequence. The only ordering used for merge.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Content hash prefix (pattern mode) or source file name (pre-split mode).
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Absolute path of the input artifact.
    pub fn in_path(&self) -> PathBuf {
        self.dir.join(StagingNames::INPUT)
    }

    /// Absolute path of the output artifact.
    pub fn out_path(&self) -> PathBuf {
        self.dir.join(StagingNames::OUTPUT)
    }

    /// Length of the input artifact in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Milliseconds the invocation took; 0 until recorded.
    pub fn runtime_ms(&self) -> u64 {
        self.runtime_ms.load(Ordering::Acquire)
    }

    /// Whether a worker has recorded a runtime for this chunk.
    pub fn is_processed(&self) -> bool {
        self.recorded.load(Ordering::Acquire)
    }

    /// Record the invocation time. Only the first call takes effect; returns false otherwise.
    pub fn record_runtime(&self, ms: u64) -> bool {
        if self.recorded.swap(true, Ordering::AcqRel) {
            warn!(
                "chunk {} ({}) already has a runtime; ignoring {} ms",
                self.ordinal, self.id, ms
            );
            return false;
        }
        self.runtime_ms.store(ms, Ordering::Release);
        true
    }

    /// Create an empty output artifact so the program finds it in place.
    pub fn create_output(&self, kind: OutputKind) -> io::Result<()> {
        let out = self.out_path();
        match kind {
            OutputKind::File => File::create(&out).map(|_| ()),
            OutputKind::Directory => fs::create_dir_all(&out),
        }
    }

    pub fn has_output(&self) -> bool {
        self.out_path().exists()
    }

    /// First `n` lines of the output file, each ending in `\n`.
    pub fn header(&self, n: usize) -> io::Result<Vec<u8>> {
        let reader = BufReader::new(File::open(self.out_path())?);
        take_lines(reader, n)
    }

    /// Copy every output line after the first `header_lines` to `w`.
    pub fn write_payload<W: Write>(&self, header_lines: usize, w: &mut W) -> io::Result<u64> {
        let reader = BufReader::new(File::open(self.out_path())?);
        copy_lines_after(reader, header_lines, w)
    }

    /// Remove the staging directory and reset the runtime.
    pub fn clean(&self) -> io::Result<()> {
        self.runtime_ms.store(0, Ordering::Release);
        self.recorded.store(false, Ordering::Release);
        match fs::remove_dir_all(&self.dir) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// Create a fresh, exclusively-owned staging directory. A stale one with the same name is removed.
fn claim_staging_dir(ordinal: usize, id: &str, staging_root: &Path) -> Result<PathBuf, RunError> {
    let dir = staging_root.join(StagingNames::dir_name(ordinal, id));
    let to_err = |source| RunError::Staging {
        ordinal,
        dir: dir.clone(),
        source,
    };
    if dir.exists() {
        debug!("Removing stale staging dir {}", dir.display());
        fs::remove_dir_all(&dir).map_err(to_err)?;
    }
    fs::create_dir(&dir).map_err(to_err)?;
    Ok(dir)
}
