//! Run-time namelist template resolution.
//!
//! The model's run configuration is a plain-text namelist containing
//! literal placeholder tokens. Each token present in the file is replaced
//! exactly once (all occurrences at once) with a concrete path or value
//! before execution. Replacement is destructive: once a token has been
//! consumed, re-running the same substitution is a no-op, which is what
//! makes an interrupted pre-run stage safe to re-invoke.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{PipelineError, Result};

/// Marker for the model grid file path (singular).
pub const GRID_FILE: &str = "__GRID_FILE_PLACEHOLDER__";
/// Marker for the initial-conditions file path (singular).
pub const INITIAL_CONDITIONS_FILE: &str = "__INITIAL_CONDITIONS_FILE_PLACEHOLDER__";
/// Marker for the accumulated forcing-file block (multi-line).
pub const FORCING_FILES: &str = "__FORCING_FILES_PLACEHOLDER__";
/// Marker for the requested number of time steps.
pub const N_STEPS: &str = "__N_STEPS_PLACEHOLDER__";
/// Marker for the model time step in seconds.
pub const TIME_STEP: &str = "__TIME_STEP_PLACEHOLDER__";
/// Marker for the biogeochemistry settings file. If present, the
/// companion file must exist next to the namelist.
pub const BGC_SETTINGS_FILE: &str = "__BGC_SETTINGS_FILE_PLACEHOLDER__";
/// Marker for the biogeochemistry tracer output list.
pub const BGC_TRACER_LIST: &str = "__BGC_TRACER_LIST_PLACEHOLDER__";
/// Marker for the biogeochemistry diagnostics output list.
pub const BGC_DIAG_LIST: &str = "__BGC_DIAG_LIST_PLACEHOLDER__";

/// Suffix distinguishing a pristine template from its editable working copy.
pub const TEMPLATE_SUFFIX: &str = "_TEMPLATE";

/// Replaces every occurrence of a literal token in a text file, writing
/// the file back in place.
///
/// Returns whether the token was found. An absent token leaves the file
/// byte-for-byte unchanged and is not an error; callers that require the
/// token to have been present must check the return value.
pub fn replace_placeholder(file: &Path, token: &str, replacement: &str) -> io::Result<bool> {
    let contents = fs::read_to_string(file)?;
    if !contents.contains(token) {
        return Ok(false);
    }
    fs::write(file, contents.replace(token, replacement))?;
    Ok(true)
}

/// Maps a `*_TEMPLATE` file name to the name of its editable working copy
/// (`marine.in_TEMPLATE` becomes `marine.in`).
///
/// Returns `None` when the file name does not carry the template suffix.
pub fn working_copy_name(template: &Path) -> Option<PathBuf> {
    let name = template.file_name()?.to_str()?;
    let stripped = name.strip_suffix(TEMPLATE_SUFFIX)?;
    Some(template.with_file_name(stripped))
}

/// Writes the run-length parameters (step count and time step) into the
/// working namelist just before launch.
///
/// A missing step count defaults to 1 with a warning, so a misconfigured
/// call produces a short run rather than an open-ended one. Returns the
/// step count actually applied.
pub fn apply_runtime_parameters(
    namelist: &Path,
    n_steps: Option<u64>,
    time_step: u32,
) -> Result<u64> {
    if !namelist.is_file() {
        return Err(PipelineError::Precondition(format!(
            "working namelist '{}' not found; run the pre-run stage first",
            namelist.display()
        )));
    }
    let n_steps = match n_steps {
        Some(n) => n,
        None => {
            warn!("number of time steps not set, defaulting to 1");
            1
        }
    };
    replace_placeholder(namelist, N_STEPS, &n_steps.to_string())?;
    replace_placeholder(namelist, TIME_STEP, &time_step.to_string())?;
    Ok(n_steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn replaces_all_occurrences_and_reports_found() {
        let dir = TempDir::new().unwrap();
        let file = write_file(&dir, "marine.in", "a __TOK__ b __TOK__ c");
        let found = replace_placeholder(&file, "__TOK__", "X").unwrap();
        assert!(found);
        assert_eq!(fs::read_to_string(&file).unwrap(), "a X b X c");
    }

    #[test]
    fn absent_token_leaves_file_unchanged() {
        let dir = TempDir::new().unwrap();
        let file = write_file(&dir, "marine.in", "no tokens here");
        let before = fs::read(&file).unwrap();
        let found = replace_placeholder(&file, "__TOK__", "X").unwrap();
        assert!(!found);
        assert_eq!(fs::read(&file).unwrap(), before);
    }

    #[test]
    fn consumed_token_makes_second_substitution_a_noop() {
        let dir = TempDir::new().unwrap();
        let file = write_file(&dir, "marine.in", "steps: __N_STEPS_PLACEHOLDER__");
        assert!(replace_placeholder(&file, N_STEPS, "100").unwrap());
        assert!(!replace_placeholder(&file, N_STEPS, "200").unwrap());
        assert_eq!(fs::read_to_string(&file).unwrap(), "steps: 100");
    }

    #[test]
    fn working_copy_strips_template_suffix() {
        let path = Path::new("/run/marine.in_TEMPLATE");
        assert_eq!(
            working_copy_name(path).unwrap(),
            PathBuf::from("/run/marine.in")
        );
        assert!(working_copy_name(Path::new("/run/marine.in")).is_none());
    }

    #[test]
    fn runtime_parameters_fill_step_tokens() {
        let dir = TempDir::new().unwrap();
        let file = write_file(
            &dir,
            "marine.in",
            "ntimes __N_STEPS_PLACEHOLDER__ dt __TIME_STEP_PLACEHOLDER__",
        );
        let applied = apply_runtime_parameters(&file, Some(480), 60).unwrap();
        assert_eq!(applied, 480);
        assert_eq!(fs::read_to_string(&file).unwrap(), "ntimes 480 dt 60");
    }

    #[test]
    fn missing_step_count_defaults_to_one() {
        let dir = TempDir::new().unwrap();
        let file = write_file(&dir, "marine.in", "ntimes __N_STEPS_PLACEHOLDER__");
        let applied = apply_runtime_parameters(&file, None, 60).unwrap();
        assert_eq!(applied, 1);
        assert_eq!(fs::read_to_string(&file).unwrap(), "ntimes 1");
    }

    #[test]
    fn missing_namelist_is_a_precondition_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("marine.in");
        assert!(matches!(
            apply_runtime_parameters(&missing, Some(1), 60),
            Err(PipelineError::Precondition(_))
        ));
    }
}
