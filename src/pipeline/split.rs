//! Splitter: input source → ordered chunks, each materialized in its own staging directory.

use log::{debug, warn};
use regex::Regex;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::chunk::Chunk;
use crate::engine::hashing::content_id;
use crate::error::RunError;
use crate::utils::tempfiles::{cleanup_staging, prepare_staging_root};
use crate::{InputSource, RunConfig};

/// Chunks in split order. Index `i` holds the chunk with ordinal `i`.
pub type ChunkList = Vec<Arc<Chunk>>;

/// Compile `boundary` so it has to match a whole line.
/// Lines are matched after lossy UTF-8 decoding, so undecodable bytes still count as characters.
pub fn compile_boundary(boundary: &str) -> Result<Regex, RunError> {
    Ok(Regex::new(&format!("^(?:{boundary})$"))?)
}

#[derive(Clone, Debug)]
pub struct Splitter {
    staging_root: PathBuf,
    flush_trailing: bool,
}

impl Splitter {
    pub fn new(staging_root: impl Into<PathBuf>) -> Self {
        Splitter {
            staging_root: staging_root.into(),
            flush_trailing: false,
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Splitter::new(config.staging_root()).flush_trailing(config.flush_trailing)
    }

    /// Emit lines after the last boundary match as a final chunk instead of dropping them.
    pub fn flush_trailing(mut self, flush: bool) -> Self {
        self.flush_trailing = flush;
        self
    }

    pub fn staging_root(&self) -> &Path {
        &self.staging_root
    }

    /// Split `source` into ordered chunks. Zero chunks is [`RunError::EmptyResult`].
    /// On any error, staging directories created so far are removed.
    pub fn split(&self, source: &InputSource) -> Result<ChunkList, RunError> {
        let root = prepare_staging_root(&self.staging_root).map_err(|source| RunError::Staging {
            ordinal: 0,
            dir: self.staging_root.clone(),
            source,
        })?;
        let mut chunks = ChunkList::new();
        let result = match source {
            InputSource::Pattern { file, boundary } => {
                self.split_pattern(file, boundary, &root, &mut chunks)
            }
            InputSource::PreSplit { dir } => self.split_dir(dir, &root, &mut chunks),
        };
        if let Err(e) = result {
            cleanup_staging(&chunks, &root);
            return Err(e);
        }
        if chunks.is_empty() {
            cleanup_staging(&chunks, &root);
            return Err(RunError::EmptyResult(source.path().to_path_buf()));
        }
        debug!("Split {} into {} chunks", source.path().display(), chunks.len());
        Ok(chunks)
    }

    /// Pattern mode: buffer lines until one fully matches `boundary`; the buffer including that
    /// line becomes one chunk.
    fn split_pattern(
        &self,
        file: &Path,
        boundary: &str,
        root: &Path,
        chunks: &mut ChunkList,
    ) -> Result<(), RunError> {
        let pattern = compile_boundary(boundary)?;
        let read_err = |source| RunError::SourceRead {
            path: file.to_path_buf(),
            source,
        };
        let mut reader = BufReader::new(File::open(file).map_err(read_err)?);

        let mut buffer: Vec<u8> = Vec::new();
        let mut buffered_lines = 0_usize;
        let mut raw = Vec::new();
        while reader.read_until(b'\n', &mut raw).map_err(read_err)? > 0 {
            let line = trim_line_ending(&raw);
            buffer.extend_from_slice(line);
            buffer.push(b'\n');
            buffered_lines += 1;
            if pattern.is_match(&String::from_utf8_lossy(line)) {
                self.push_content(&buffer, root, chunks)?;
                buffer.clear();
                buffered_lines = 0;
            }
            raw.clear();
        }

        if buffered_lines > 0 {
            if self.flush_trailing {
                debug!("Flushing {} trailing lines as a final chunk", buffered_lines);
                self.push_content(&buffer, root, chunks)?;
            } else {
                warn!(
                    "{} trailing line(s) in {} never matched the boundary pattern and were dropped",
                    buffered_lines,
                    file.display()
                );
            }
        }
        Ok(())
    }

    fn push_content(&self, content: &[u8], root: &Path, chunks: &mut ChunkList) -> Result<(), RunError> {
        let chunk = Chunk::from_content(chunks.len(), content_id(content), root, content)?;
        chunks.push(Arc::new(chunk));
        Ok(())
    }

    /// Pre-split mode: every regular file directly in `dir`, in file-name order.
    fn split_dir(&self, dir: &Path, root: &Path, chunks: &mut ChunkList) -> Result<(), RunError> {
        let read_err = |source: io::Error| RunError::SourceRead {
            path: dir.to_path_buf(),
            source,
        };
        if !dir.is_dir() {
            return Err(read_err(io::Error::new(
                io::ErrorKind::NotFound,
                "not a readable directory",
            )));
        }
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| read_err(e.into()))?;
            // Sub-directories (including a staging root placed here) are not input.
            if !entry.file_type().is_file() {
                continue;
            }
            let chunk = Chunk::from_file(chunks.len(), root, entry.path())?;
            chunks.push(Arc::new(chunk));
        }
        Ok(())
    }
}

/// Strip a trailing `\n` or `\r\n`.
fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_must_match_whole_line() {
        let re = compile_boundary("end").unwrap();
        assert!(re.is_match("end"));
        assert!(!re.is_match("the end"));
        let re = compile_boundary("a|b").unwrap();
        assert!(re.is_match("b"));
        assert!(!re.is_match("ab"));
    }

    #[test]
    fn test_default_boundary_matches_empty_line() {
        let re = compile_boundary(crate::DEFAULT_BOUNDARY).unwrap();
        assert!(re.is_match(""));
        assert!(re.is_match(&String::from_utf8_lossy(b"caf\xe9")));
    }

    #[test]
    fn test_trim_line_ending() {
        assert_eq!(trim_line_ending(b"abc\r\n"), b"abc");
        assert_eq!(trim_line_ending(b"abc\n"), b"abc");
        assert_eq!(trim_line_ending(b"abc"), b"abc");
    }
}
