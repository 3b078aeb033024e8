use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::chunk::Chunk;

/// Temporary path the merged output is written to before the final rename:
/// `.<name>.<pid>.tmp` next to `dest`, so an existing `<name>.tmp` is never touched.
pub fn temp_path_for(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "merged".to_string());
    dest.parent()
        .unwrap_or(Path::new("."))
        .join(format!(".{name}.{}.tmp", std::process::id()))
}

/// Create the staging root if needed and return it as an absolute path.
pub fn prepare_staging_root(root: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(root)?;
    root.canonicalize()
}

/// Remove every chunk's staging directory, then the root if nothing else is left in it.
/// Returns how many chunk directories could not be removed.
pub fn cleanup_staging(chunks: &[Arc<Chunk>], root: &Path) -> usize {
    let mut failed = 0;
    for chunk in chunks {
        if let Err(e) = chunk.clean() {
            warn!("cleanup {}: {}", chunk.dir().display(), e);
            failed += 1;
        }
    }
    // remove_dir only succeeds on an empty directory; anything foreign stays.
    match fs::remove_dir(root) {
        Ok(()) => debug!("Removed staging root {}", root.display()),
        Err(e) => debug!("Staging root {} kept: {}", root.display(), e),
    }
    failed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_path_is_hidden_and_pid_qualified() {
        let temp = temp_path_for(Path::new("/data/merged.txt"));
        assert_eq!(temp.parent(), Some(Path::new("/data")));
        assert_eq!(
            temp.file_name().map(|n| n.to_string_lossy().into_owned()),
            Some(format!(".merged.txt.{}.tmp", std::process::id()))
        );
        assert_ne!(temp, Path::new("/data/merged.txt.tmp"));
    }
}
