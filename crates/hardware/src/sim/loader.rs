//! Program Loader.
//!
//! Reads assembly source from disk and parses it into a [`Program`].

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::common::SimError;
use crate::isa::{Program, parse_program};

/// Reads and parses the program at `path`.
///
/// # Errors
///
/// Returns [`SimError::Io`] if the file cannot be read and [`SimError::Parse`] if its
/// contents are not a valid program.
pub fn load_program(path: impl AsRef<Path>) -> Result<Program, SimError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| SimError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let program = parse_program(&source)?;
    debug!(
        path = %path.display(),
        instructions = program.len(),
        segments = program.data().len(),
        "program loaded"
    );
    Ok(program)
}
