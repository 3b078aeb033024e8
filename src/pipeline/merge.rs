//! Merger: reassemble chunk outputs in split order into one artifact.
//!
//! Always driven by the split-order chunk list, never by the dispatch queue, and only after
//! the pool's barrier join has guaranteed every output is complete.

use log::{debug, warn};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;

use crate::chunk::Chunk;
use crate::error::RunError;
use crate::utils::config::HEADER_LINES_ENV;
use crate::utils::tempfiles::temp_path_for;
use crate::{ArgTemplate, ChunkFailure, MergeStrategy, RunConfig};

#[derive(Clone, Debug)]
pub struct Merger {
    strategy: MergeStrategy,
    header_lines: usize,
}

impl Merger {
    pub fn new(strategy: MergeStrategy, header_lines: usize) -> Self {
        Merger {
            strategy,
            header_lines,
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Merger::new(config.merge.clone(), config.header_lines)
    }

    /// Merge `chunks` (split order) into `dest`.
    /// Returns the chunks whose output was missing or unreadable; their contribution is absent.
    pub fn merge(&self, chunks: &[Arc<Chunk>], dest: &Path) -> Result<Vec<ChunkFailure>, RunError> {
        let mut missing: Vec<ChunkFailure> = chunks
            .iter()
            .filter(|c| !c.has_output())
            .map(|c| failure(c, "output missing at merge"))
            .collect();
        for f in &missing {
            warn!("chunk {} ({}): {}", f.ordinal, f.id, f.reason);
        }
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| RunError::MergeWrite {
                path: dest.to_path_buf(),
                source,
            })?;
        }

        debug!(
            "Merging {} chunks into {} ({} strategy)",
            chunks.len(),
            dest.display(),
            self.strategy.name()
        );
        match &self.strategy {
            MergeStrategy::ConcatenateWithHeader => {
                let unreadable = self.concatenate(chunks, dest)?;
                missing.extend(unreadable);
                missing.sort_by_key(|f| f.ordinal);
            }
            MergeStrategy::UserSupplied(merge_fn) => {
                merge_fn(chunks, dest).map_err(|e| RunError::MergeStrategy {
                    strategy: self.strategy.name(),
                    reason: format!("{e:#}"),
                })?;
            }
            MergeStrategy::ExternalProgram { program, args } => {
                self.run_external(program, args, chunks, dest)?;
            }
        }
        Ok(missing)
    }

    /// Header of the first chunk with output, then every chunk's post-header lines.
    /// Written to a temp file and renamed over `dest` once complete.
    fn concatenate(&self, chunks: &[Arc<Chunk>], dest: &Path) -> Result<Vec<ChunkFailure>, RunError> {
        let temp = temp_path_for(dest);
        let write_err = |source| RunError::MergeWrite {
            path: dest.to_path_buf(),
            source,
        };
        let result = self.write_concatenated(chunks, &temp);
        let unreadable = match result {
            Ok(unreadable) => unreadable,
            Err(e) => {
                let _ = fs::remove_file(&temp);
                return Err(write_err(e));
            }
        };
        fs::rename(&temp, dest).map_err(write_err)?;
        Ok(unreadable)
    }

    fn write_concatenated(&self, chunks: &[Arc<Chunk>], temp: &Path) -> io::Result<Vec<ChunkFailure>> {
        let mut w = BufWriter::new(File::create(temp)?);
        let mut unreadable = Vec::new();

        if self.header_lines > 0
            && let Some(first) = chunks.iter().find(|c| c.has_output())
        {
            match first.header(self.header_lines) {
                Ok(header) => w.write_all(&header)?,
                Err(e) => warn!("header from chunk {}: {}", first.ordinal(), e),
            }
        }
        for chunk in chunks.iter().filter(|c| c.has_output()) {
            // Read errors are per chunk; write errors abort the phase.
            let mut payload = Vec::new();
            match chunk.write_payload(self.header_lines, &mut payload) {
                Ok(_) => w.write_all(&payload)?,
                Err(e) => {
                    warn!("chunk {} ({}): read output: {}", chunk.ordinal(), chunk.id(), e);
                    unreadable.push(failure(chunk, &format!("output unreadable at merge: {e}")));
                }
            }
        }
        w.flush()?;
        Ok(unreadable)
    }

    /// `program args...` then each existing chunk output in split order. Without an `{out}`
    /// placeholder in `args`, the program's stdout becomes `dest`.
    fn run_external(
        &self,
        program: &Path,
        args: &[String],
        chunks: &[Arc<Chunk>],
        dest: &Path,
    ) -> Result<(), RunError> {
        let strategy_err = |reason: String| RunError::MergeStrategy {
            strategy: self.strategy.name(),
            reason,
        };
        let dest_str = dest.to_string_lossy();
        let writes_dest = args.iter().any(|a| a.contains(ArgTemplate::OUT_PLACEHOLDER));

        let mut cmd = Command::new(program);
        cmd.args(
            args.iter()
                .map(|a| a.replace(ArgTemplate::OUT_PLACEHOLDER, &dest_str)),
        )
        .args(chunks.iter().filter(|c| c.has_output()).map(|c| c.out_path()))
        .env(HEADER_LINES_ENV, self.header_lines.to_string())
        .stdin(Stdio::null());
        if !writes_dest {
            let out = File::create(dest).map_err(|source| RunError::MergeWrite {
                path: dest.to_path_buf(),
                source,
            })?;
            cmd.stdout(Stdio::from(out));
        }

        let status = cmd
            .status()
            .map_err(|e| strategy_err(format!("could not run {}: {}", program.display(), e)))?;
        if !status.success() {
            return Err(strategy_err(format!(
                "{} exited with {}",
                program.display(),
                status
            )));
        }
        Ok(())
    }
}

fn failure(chunk: &Chunk, reason: &str) -> ChunkFailure {
    ChunkFailure {
        ordinal: chunk.ordinal(),
        id: chunk.id().to_string(),
        reason: reason.to_string(),
    }
}
