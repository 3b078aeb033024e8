use clap::Parser;
use std::path::PathBuf;

use crate::utils::splitrun_toml::RunSettings;

/// Parallelize any line-oriented command-line tool.
#[derive(Clone, Debug, Parser)]
#[command(name = "splitrun")]
#[command(
    about = "Split input into chunks, run a program on each chunk in parallel, merge the results in order.",
    after_help = "Arguments after `--` form the per-chunk argument template; {in} and {out} are replaced by the chunk's paths.\nWithout a template or flags, each chunk is fed on stdin and stdout becomes its output."
)]
pub struct Cli {
    /// Input file to split by the boundary pattern.
    #[arg(long, short = 'i', value_name = "FILE", conflicts_with = "input_dir")]
    pub input: Option<PathBuf>,

    /// Directory of pre-split files; each file is one chunk.
    #[arg(long, short = 'd', value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Boundary regex; a line fully matching it closes the current chunk. Default: every line.
    #[arg(long, short = 'p', value_name = "REGEX")]
    pub split: Option<String>,

    /// Merged output file.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Program run once per chunk.
    #[arg(long, short = 'e', value_name = "PROGRAM")]
    pub exec: Option<PathBuf>,

    /// Flag placed before the chunk's input path (otherwise stdin is used).
    #[arg(long, value_name = "FLAG", allow_hyphen_values = true)]
    pub in_flag: Option<String>,

    /// Flag placed before the chunk's output path (otherwise stdout is used).
    #[arg(long, value_name = "FLAG", allow_hyphen_values = true)]
    pub out_flag: Option<String>,

    /// Worker threads. Default: available threads.
    #[arg(long, short = 'j', value_parser = clap::value_parser!(usize))]
    pub workers: Option<usize>,

    /// Header lines at the top of each chunk's output; kept once, from the first chunk.
    #[arg(long, short = 'H', value_parser = clap::value_parser!(usize))]
    pub header_lines: Option<usize>,

    /// The program writes a directory (not a file) at {out}.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub out_dir: Option<bool>,

    /// Merge strategy.
    #[arg(long, value_parser = ["default", "external"])]
    pub merge: Option<String>,

    /// Program used by the external merge.
    #[arg(long, value_name = "PROGRAM")]
    pub merge_exec: Option<PathBuf>,

    /// Argument for the external merge program (repeatable); {out} is the merged output path.
    #[arg(long = "merge-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub merge_args: Vec<String>,

    /// Write run statistics. Default file: stats.csv next to the output.
    #[arg(long, value_name = "FILE", num_args = 0..=1)]
    pub stats: Option<Option<PathBuf>>,

    /// Parent directory for per-chunk staging directories.
    #[arg(long, value_name = "DIR")]
    pub staging_dir: Option<PathBuf>,

    /// Keep staging directories after the run.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub keep_staging: Option<bool>,

    /// Emit trailing lines that never matched the boundary as a final chunk.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub flush_trailing: Option<bool>,

    /// Config file (TOML, or JSON by extension). Default: .splitrun.toml in the working directory.
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Save the effective settings to FILE before running.
    #[arg(long, value_name = "FILE")]
    pub save_config: Option<PathBuf>,

    /// Verbose output and a progress bar.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    /// Per-chunk argument template.
    #[arg(last = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

impl Cli {
    /// Settings given on the command line; unset flags stay None so file values survive.
    pub fn to_settings(&self) -> RunSettings {
        let (stats, stats_file) = match &self.stats {
            None => (None, None),
            Some(None) => (Some(true), None),
            Some(Some(path)) => (Some(true), Some(path.clone())),
        };
        RunSettings {
            input: self.input.clone(),
            input_dir: self.input_dir.clone(),
            split: self.split.clone(),
            output: self.output.clone(),
            exec: self.exec.clone(),
            args: (!self.args.is_empty()).then(|| self.args.clone()),
            in_flag: self.in_flag.clone(),
            out_flag: self.out_flag.clone(),
            workers: self.workers,
            header_lines: self.header_lines,
            output_is_dir: self.out_dir,
            merge: self.merge.clone(),
            merge_exec: self.merge_exec.clone(),
            merge_args: (!self.merge_args.is_empty()).then(|| self.merge_args.clone()),
            stats,
            stats_file,
            staging_dir: self.staging_dir.clone(),
            keep_staging: self.keep_staging,
            flush_trailing: self.flush_trailing,
            verbose: self.verbose,
        }
    }
}
