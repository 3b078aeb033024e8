//! Load and save `.splitrun.toml` (or a JSON file with the same keys). CLI only; library callers
//! build a [`RunConfig`](crate::RunConfig) directly.

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::config::PackagePaths;
use crate::{ArgTemplate, DEFAULT_BOUNDARY, InputSource, MergeStrategy, OutputKind, RunConfig};

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SplitrunFile {
    #[serde(default)]
    pub settings: RunSettings,
}

/// Every field optional: the file and the CLI each fill in what they know, CLI last.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RunSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exec: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_flag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_flag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_lines: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_is_dir: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_exec: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_args: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staging_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_staging: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flush_trailing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
}

/// Overwrite a settings field from `other` when present there.
macro_rules! overlay_opt {
    ($base:expr, $other:expr, $($field:ident),+ $(,)?) => {
        $(
            if $other.$field.is_some() {
                $base.$field = $other.$field;
            }
        )+
    };
}

impl RunSettings {
    /// Apply `other` on top of `self` (only fields `other` sets).
    pub fn overlay(&mut self, other: RunSettings) {
        // Picking one input kind clears the other so a file setting cannot conflict with the CLI.
        if other.input.is_some() {
            self.input_dir = None;
        }
        if other.input_dir.is_some() {
            self.input = None;
        }
        overlay_opt!(
            self,
            other,
            input,
            input_dir,
            split,
            output,
            exec,
            args,
            in_flag,
            out_flag,
            workers,
            header_lines,
            output_is_dir,
            merge,
            merge_exec,
            merge_args,
            stats,
            stats_file,
            staging_dir,
            keep_staging,
            flush_trailing,
            verbose,
        );
    }

    /// Resolve into a [`RunConfig`]. Fails on missing or contradictory settings.
    pub fn to_run_config(&self) -> Result<RunConfig> {
        let input = match (&self.input, &self.input_dir) {
            (Some(_), Some(_)) => bail!("give either an input file or an input directory, not both"),
            (Some(file), None) => InputSource::Pattern {
                file: file.clone(),
                boundary: self
                    .split
                    .clone()
                    .unwrap_or_else(|| DEFAULT_BOUNDARY.to_string()),
            },
            (None, Some(dir)) => InputSource::PreSplit { dir: dir.clone() },
            (None, None) => bail!("no input: set an input file (--input) or directory (--input-dir)"),
        };
        let output = self
            .output
            .clone()
            .ok_or_else(|| anyhow!("no output destination (--output)"))?;
        let exec = self
            .exec
            .clone()
            .ok_or_else(|| anyhow!("no executable (--exec)"))?;

        let mut config = RunConfig::new(input, output, exec);
        config.args = self.arg_template();
        config.merge = self.merge_strategy()?;
        if let Some(n) = self.workers {
            config.workers = n;
        }
        config.header_lines = self.header_lines.unwrap_or(0);
        if self.output_is_dir.unwrap_or(false) {
            config.output_kind = OutputKind::Directory;
        }
        config.stats = self.stats_path(&config.output);
        config.staging_root = self.staging_dir.clone();
        config.keep_staging = self.keep_staging.unwrap_or(false);
        config.flush_trailing = self.flush_trailing.unwrap_or(false);
        config.verbose = self.verbose.unwrap_or(false);
        Ok(config)
    }

    fn arg_template(&self) -> ArgTemplate {
        match &self.args {
            Some(args) if !args.is_empty() => ArgTemplate::Template(args.clone()),
            _ if self.in_flag.is_some() || self.out_flag.is_some() => ArgTemplate::Flags {
                in_flag: self.in_flag.clone(),
                out_flag: self.out_flag.clone(),
            },
            _ => ArgTemplate::Redirect,
        }
    }

    fn merge_strategy(&self) -> Result<MergeStrategy> {
        match self.merge.as_deref().unwrap_or("default") {
            "default" => Ok(MergeStrategy::ConcatenateWithHeader),
            "external" => {
                let program = self
                    .merge_exec
                    .clone()
                    .ok_or_else(|| anyhow!("external merge needs a merge program (--merge-exec)"))?;
                Ok(MergeStrategy::ExternalProgram {
                    program,
                    args: self.merge_args.clone().unwrap_or_default(),
                })
            }
            "custom" => bail!("custom merge is only available through the library API"),
            other => bail!("unknown merge strategy '{other}' (expected default or external)"),
        }
    }

    fn stats_path(&self, output: &Path) -> Option<PathBuf> {
        if let Some(p) = &self.stats_file {
            return Some(p.clone());
        }
        self.stats.unwrap_or(false).then(|| {
            output
                .parent()
                .unwrap_or(Path::new("."))
                .join(PackagePaths::get().stats_filename())
        })
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Load an explicit config file (TOML, or JSON by extension).
pub fn load_config_file(path: &Path) -> Result<SplitrunFile> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    if is_json(path) {
        serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))
    } else {
        toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
    }
}

/// Load `.splitrun.toml` from `dir` if present. A file that exists but does not parse is an error.
pub fn load_default_config(dir: &Path) -> Result<Option<SplitrunFile>> {
    let path = dir.join(PackagePaths::get().config_filename());
    if !path.is_file() {
        return Ok(None);
    }
    load_config_file(&path).map(Some)
}

/// Write `file` to `path` (TOML, or JSON by extension).
pub fn save_config_file(path: &Path, file: &SplitrunFile) -> Result<()> {
    let s = if is_json(path) {
        serde_json::to_string_pretty(file).context("serialize config as JSON")?
    } else {
        toml::to_string_pretty(file).context("serialize config as TOML")?
    };
    std::fs::write(path, s).with_context(|| format!("write config file {}", path.display()))
}
