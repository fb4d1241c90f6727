//! File-level generation runner.
//!
//! Wraps the pure pipeline (parse → classify → build → render) with the
//! outer concerns: reading inputs, deriving output paths, writing only when
//! the content changed, and optionally scanning whole directories for model
//! files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::errors::Error;
use crate::parse;
use crate::render;

/// Suffix of generated files; scanned directories skip them on re-runs.
const GENERATED_SUFFIX: &str = "_queryset";

const FILE_HEADER: &str = "//! Auto-generated query sets. Do not edit manually.\n\
                           //!\n\
                           //! Generated by queryset-gen. The enclosing module is responsible\n\
                           //! for importing the backend (`orm`) and the model types.\n\n";

/// Builder for configuring and running the query-set generator.
///
/// Either give it a single input file (and optionally an output path), or
/// one or more scan paths; scanning generates a `<stem>_queryset.rs` sibling
/// for every file that contains annotated structs.
pub struct QuerySetGenerator {
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
    scan_paths: Vec<PathBuf>,
}

impl QuerySetGenerator {
    pub fn new() -> Self {
        QuerySetGenerator {
            input_file: None,
            output_file: None,
            scan_paths: Vec::new(),
        }
    }

    /// Set the single model file to generate from.
    pub fn input_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_file = Some(path.into());
        self
    }

    /// Set the output file path. Default: `<input stem>_queryset.rs` next to
    /// the input.
    pub fn output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    /// Add a directory to scan for model files.
    ///
    /// Can be called multiple times to scan multiple directories. Files that
    /// fail to parse are logged and skipped rather than aborting the scan.
    pub fn scan_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.scan_paths.push(path.into());
        self
    }

    /// Run the generator.
    pub fn run(self) -> Result<()> {
        if self.input_file.is_none() && self.scan_paths.is_empty() {
            bail!("nothing to do: set an input file or a scan path");
        }

        if let Some(input) = &self.input_file {
            let output = match &self.output_file {
                Some(path) => path.clone(),
                None => derived_output_path(input),
            };
            match generate_file(input, &output)? {
                Some(true) => info!("wrote query sets to {}", output.display()),
                Some(false) => debug!("{} is up to date", output.display()),
                // single-file mode treats an empty result as a caller mistake
                None => bail!("no structs to generate query set in {}", input.display()),
            }
        }

        for path in &self.scan_paths {
            self.scan_directory(path)
                .with_context(|| format!("failed to scan {}", path.display()))?;
        }

        Ok(())
    }

    fn scan_directory(&self, path: &Path) -> Result<()> {
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let file = entry.path();
            if !is_model_candidate(file) {
                continue;
            }
            // scanned trees routinely hold fragments that don't parse
            // standalone; those are skipped, not fatal
            let text = match generate_queryset_text(file) {
                Ok(text) => text,
                Err(err) => {
                    warn!("skipping {}: {err}", file.display());
                    continue;
                }
            };
            let Some(text) = text else {
                debug!("{}: no annotated structs", file.display());
                continue;
            };
            let output = derived_output_path(file);
            match write_output(&output, &text)? {
                true => info!("wrote query sets to {}", output.display()),
                false => debug!("{} is up to date", output.display()),
            }
        }
        Ok(())
    }
}

impl Default for QuerySetGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the pure pipeline for one file: `None` when the file carries no
/// annotated structs.
pub fn generate_queryset_text(path: &Path) -> Result<Option<String>, Error> {
    let parsed = parse::parse_file(path)?;
    render::generate(&parsed)
}

/// Generates one file. `Ok(None)` means nothing to generate; `Ok(Some(b))`
/// reports whether the output was actually (re)written.
fn generate_file(input: &Path, output: &Path) -> Result<Option<bool>> {
    let text = generate_queryset_text(input)
        .with_context(|| format!("can't generate query sets for {}", input.display()))?;
    let Some(text) = text else {
        return Ok(None);
    };
    write_output(output, &text).map(Some)
}

/// Writes the headed output file, reporting whether anything changed.
fn write_output(output: &Path, text: &str) -> Result<bool> {
    let code = format!("{FILE_HEADER}{text}");

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("can't create directory {}", parent.display()))?;
        }
    }

    // only write if content changed, to avoid needless recompilation
    if let Ok(existing) = fs::read_to_string(output) {
        if existing == code {
            return Ok(false);
        }
    }

    fs::write(output, code).map_err(|source| Error::Write {
        path: output.to_path_buf(),
        source,
    })?;
    Ok(true)
}

/// `models.rs` becomes `models_queryset.rs` in the same directory.
fn derived_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("models");
    input.with_file_name(format!("{stem}{GENERATED_SUFFIX}.rs"))
}

/// Scan candidates are `.rs` files that are neither generated outputs nor
/// build artifacts.
fn is_model_candidate(path: &Path) -> bool {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };
    path.extension().is_some_and(|ext| ext == "rs")
        && !stem.ends_with(GENERATED_SUFFIX)
        && !path.components().any(|c| c.as_os_str() == "target")
}
