//! Line and path utilities

use std::io::{self, BufRead, Write};
use std::path::Path;

/// Read one line (bytes up to and including `\n`) into `buf`. Returns false at EOF.
/// A final line without a terminator gets one, so every emitted line ends in `\n`.
fn next_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<bool> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(false);
    }
    if buf.last() != Some(&b'\n') {
        buf.push(b'\n');
    }
    Ok(true)
}

/// First `n` lines of `reader`. Fewer when the input is shorter.
pub fn take_lines<R: BufRead>(mut reader: R, n: usize) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut line = Vec::new();
    for _ in 0..n {
        if !next_line(&mut reader, &mut line)? {
            break;
        }
        out.extend_from_slice(&line);
    }
    Ok(out)
}

/// Skip `skip` lines, copy the rest to `w`. Returns bytes written.
pub fn copy_lines_after<R: BufRead, W: Write>(mut reader: R, skip: usize, w: &mut W) -> io::Result<u64> {
    let mut line = Vec::new();
    for _ in 0..skip {
        if !next_line(&mut reader, &mut line)? {
            return Ok(0);
        }
    }
    let mut written = 0_u64;
    while next_line(&mut reader, &mut line)? {
        w.write_all(&line)?;
        written += line.len() as u64;
    }
    Ok(written)
}

/// Replace every `{in}` / `{out}` in `arg` with the given paths.
pub fn substitute_placeholders(arg: &str, in_path: &Path, out_path: &Path) -> String {
    use crate::ArgTemplate;
    arg.replace(
        ArgTemplate::IN_PLACEHOLDER,
        &in_path.to_string_lossy(),
    )
    .replace(ArgTemplate::OUT_PLACEHOLDER, &out_path.to_string_lossy())
}
