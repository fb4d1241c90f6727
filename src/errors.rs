use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for a generation run.
///
/// Every failure aborts the whole run for the offending input file; the
/// pipeline is pure, so retrying an identical input reproduces the failure.
#[derive(Debug, Error)]
pub enum Error {
    /// Requested struct declaration is absent from the parsed source unit.
    #[error("struct `{name}` not found in {}", path.display())]
    StructNotFound { name: String, path: PathBuf },

    /// Source unit could not be read from disk.
    #[error("can't read source file {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source unit failed to parse as Rust.
    #[error("can't parse source file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: syn::Error,
    },

    /// Rendered output did not parse back as Rust, i.e. a template bug.
    #[error("can't render query sets: {source}")]
    Render {
        #[source]
        source: syn::Error,
    },

    /// Output file could not be written.
    #[error("can't write output file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
