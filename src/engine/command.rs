//! Build the external command line for one chunk.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::chunk::Chunk;
use crate::engine::tools::substitute_placeholders;
use crate::{ArgTemplate, OutputKind, RunConfig};

/// Program, argument template and output kind shared (read-only) by every worker.
#[derive(Clone, Debug)]
pub struct Invocation {
    pub program: PathBuf,
    pub template: ArgTemplate,
    pub output_kind: OutputKind,
}

impl From<&RunConfig> for Invocation {
    fn from(config: &RunConfig) -> Self {
        Invocation {
            program: config.executable.clone(),
            template: config.args.clone(),
            output_kind: config.output_kind,
        }
    }
}

impl Invocation {
    /// Arguments (program excluded) for a chunk whose artifacts live at `in_path` / `out_path`.
    /// Sides handled by redirection do not appear here.
    pub fn args_for(&self, in_path: &Path, out_path: &Path) -> Vec<String> {
        match &self.template {
            ArgTemplate::Redirect => Vec::new(),
            ArgTemplate::Flags { in_flag, out_flag } => {
                let mut args = Vec::with_capacity(4);
                if let Some(flag) = in_flag {
                    args.push(flag.clone());
                    args.push(in_path.to_string_lossy().into_owned());
                }
                if let Some(flag) = out_flag {
                    args.push(flag.clone());
                    args.push(out_path.to_string_lossy().into_owned());
                }
                args
            }
            ArgTemplate::Template(template) => template
                .iter()
                .map(|a| substitute_placeholders(a, in_path, out_path))
                .collect(),
        }
    }

    /// Printable command line, redirections shown shell-style.
    pub fn display_for(&self, in_path: &Path, out_path: &Path) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args_for(in_path, out_path));
        if self.template.redirects_stdin() {
            parts.push(format!("< {}", in_path.display()));
        }
        if self.template.redirects_stdout() {
            parts.push(format!("> {}", out_path.display()));
        }
        parts.join(" ")
    }

    /// Command for `chunk`, stdio wired up. stdout (unless it is the output artifact) and stderr are
    /// piped so `Command::output` collects them as one log stream.
    pub fn command_for(&self, chunk: &Chunk) -> io::Result<Command> {
        let in_path = chunk.in_path();
        let out_path = chunk.out_path();
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args_for(&in_path, &out_path));
        if self.template.redirects_stdin() {
            cmd.stdin(Stdio::from(File::open(&in_path)?));
        } else {
            cmd.stdin(Stdio::null());
        }
        if self.template.redirects_stdout() {
            cmd.stdout(Stdio::from(File::create(&out_path)?));
        } else {
            cmd.stdout(Stdio::piped());
        }
        cmd.stderr(Stdio::piped());
        Ok(cmd)
    }
}
