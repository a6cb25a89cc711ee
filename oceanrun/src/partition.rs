//! Pre-run stage: dataset partitioning and namelist resolution.
//!
//! Each eligible input dataset is split into one file per worker process
//! by an external partition capability, the resulting files are gathered
//! into a `PARTITIONED` sibling directory, and references to them are
//! written into the run-time namelist. Any failure aborts the stage;
//! partitions already produced are left on disk so the case can be
//! resumed by re-running the stage.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::dataset::{DatasetKind, InputDataset};
use crate::discretization::Discretization;
use crate::error::{PipelineError, Result};
use crate::template::{
    replace_placeholder, BGC_DIAG_LIST, BGC_SETTINGS_FILE, BGC_TRACER_LIST, FORCING_FILES,
    GRID_FILE, INITIAL_CONDITIONS_FILE,
};

/// External capability that splits one dataset file into one file per
/// worker process along a 2-D decomposition.
///
/// The returned paths must be ordered and stably named; the numbering
/// scheme itself is owned by the tool.
pub trait PartitionTool {
    fn partition(&self, file: &Path, n_procs_x: u32, n_procs_y: u32) -> Result<Vec<PathBuf>>;
}

/// Fixed file names of the biogeochemistry companion files, sought next
/// to the working namelist when the corresponding token is present.
const BGC_COMPANIONS: &[(&str, &str)] = &[
    (BGC_SETTINGS_FILE, "bgc.in"),
    (BGC_TRACER_LIST, "bgc_tracer_output_list"),
    (BGC_DIAG_LIST, "bgc_diagnostics_output_list"),
];

/// Partitions every eligible dataset and resolves the input-file tokens
/// of the working namelist.
///
/// A dataset is eligible when its validity interval overlaps the
/// requested simulation interval (all datasets when no filter applies).
/// Eligible datasets must already be materialized locally.
///
/// Forcing-family datasets contribute one namelist line per backing
/// file, in dataset-then-file order, substituted as a single block after
/// all datasets are processed. Grid and initial-conditions datasets are
/// singular: more than one backing file is fatal.
///
/// # Errors
///
/// Precondition error for a missing namelist or unmaterialized dataset;
/// layout error for backing files spanning directories; configuration
/// error for multiple files on a singular kind; missing-dependency error
/// for an absent biogeochemistry companion file.
pub fn prepare_run(
    namelist: &Path,
    datasets: &mut [InputDataset],
    discretization: &Discretization,
    tool: &dyn PartitionTool,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<()> {
    if !namelist.is_file() {
        return Err(PipelineError::Precondition(format!(
            "editable namelist '{}' not found",
            namelist.display()
        )));
    }

    let mut forcing_block = String::new();
    for dataset in datasets.iter_mut() {
        if !dataset.overlaps(start, end) {
            debug!(dataset = dataset.name(), "outside simulation interval, skipped");
            continue;
        }
        partition_dataset(dataset, discretization, tool)?;
        reference_in_namelist(namelist, dataset, &mut forcing_block)?;
    }

    replace_placeholder(namelist, FORCING_FILES, &forcing_block)?;
    resolve_bgc_companions(namelist)?;
    Ok(())
}

/// Splits one dataset's backing files and gathers the partitions into
/// the dataset's `PARTITIONED` directory.
fn partition_dataset(
    dataset: &mut InputDataset,
    discretization: &Discretization,
    tool: &dyn PartitionTool,
) -> Result<()> {
    if !dataset.exists_locally() {
        return Err(PipelineError::Precondition(format!(
            "dataset '{}' ({}) is not materialized locally; fetch it before the pre-run stage",
            dataset.name(),
            dataset.kind().display()
        )));
    }
    if dataset.kind().is_singular() && dataset.working_paths().len() > 1 {
        return Err(PipelineError::Configuration(format!(
            "the model accepts only one {} file, dataset '{}' has {}",
            dataset.kind().display(),
            dataset.name(),
            dataset.working_paths().len()
        )));
    }
    if dataset.is_partitioned() {
        debug!(dataset = dataset.name(), "already partitioned, skipped");
        return Ok(());
    }

    let (nx, ny) = (discretization.n_procs_x(), discretization.n_procs_y());
    let partition_dir = dataset.partition_dir()?;
    fs::create_dir_all(&partition_dir)?;

    let mut gathered = Vec::new();
    for file in dataset.working_paths().to_vec() {
        info!(file = %file.display(), nx, ny, "partitioning input dataset");
        let produced = tool.partition(&file, nx, ny)?;
        if produced.len() as u32 != discretization.n_procs_tot() {
            warn!(
                file = %file.display(),
                produced = produced.len(),
                expected = discretization.n_procs_tot(),
                "partition tool produced an unexpected file count"
            );
        }
        for piece in produced {
            let target = partition_dir.join(piece.file_name().ok_or_else(|| {
                PipelineError::Precondition(format!(
                    "partition tool returned a path with no file name: {}",
                    piece.display()
                ))
            })?);
            if piece != target {
                fs::rename(&piece, &target)?;
            }
            gathered.push(target);
        }
    }
    dataset.set_partitioned_files(gathered);
    Ok(())
}

/// Writes the dataset's partitioned-path reference into the namelist, or
/// accumulates it into the forcing block for forcing families.
fn reference_in_namelist(
    namelist: &Path,
    dataset: &InputDataset,
    forcing_block: &mut String,
) -> Result<()> {
    let partition_dir = dataset.partition_dir()?;
    match dataset.kind() {
        DatasetKind::ModelGrid | DatasetKind::InitialConditions => {
            // Singular kinds were validated to have exactly one file.
            let file = &dataset.working_paths()[0];
            let reference = namelist_line(&partition_dir, file);
            let token = if dataset.kind() == DatasetKind::ModelGrid {
                GRID_FILE
            } else {
                INITIAL_CONDITIONS_FILE
            };
            replace_placeholder(namelist, token, &reference)?;
        }
        kind if kind.is_forcing() => {
            for file in dataset.working_paths() {
                forcing_block.push_str(&namelist_line(&partition_dir, file));
            }
        }
        _ => unreachable!("every dataset kind is singular or forcing"),
    }
    Ok(())
}

/// One namelist entry referencing a file's partitioned set: the original
/// base name under the `PARTITIONED` directory.
fn namelist_line(partition_dir: &Path, file: &Path) -> String {
    let name = file.file_name().unwrap_or_default();
    format!("     {} \n", partition_dir.join(name).display())
}

/// Resolves the biogeochemistry tokens. A token's presence obligates the
/// existence of its companion file next to the namelist.
fn resolve_bgc_companions(namelist: &Path) -> Result<()> {
    let dir = namelist.parent().unwrap_or_else(|| Path::new("."));
    for (token, file_name) in BGC_COMPANIONS {
        let companion = dir.join(file_name);
        let found = replace_placeholder(namelist, token, &companion.display().to_string())?;
        if found && !companion.is_file() {
            return Err(PipelineError::MissingDependency { path: companion });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Writes `nx * ny` empty partition files next to the input and
    /// records every call.
    struct FakePartitioner {
        calls: Mutex<Vec<PathBuf>>,
    }

    impl FakePartitioner {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl PartitionTool for FakePartitioner {
        fn partition(&self, file: &Path, n_procs_x: u32, n_procs_y: u32) -> Result<Vec<PathBuf>> {
            self.calls.lock().unwrap().push(file.to_path_buf());
            let stem = file.file_stem().unwrap().to_str().unwrap();
            let ext = file.extension().unwrap().to_str().unwrap();
            let mut out = Vec::new();
            for idx in 0..(n_procs_x * n_procs_y) {
                let piece = file.with_file_name(format!("{}.{:03}.{}", stem, idx, ext));
                fs::write(&piece, "").unwrap();
                out.push(piece);
            }
            Ok(out)
        }
    }

    fn dataset(dir: &TempDir, name: &str, kind: DatasetKind, files: &[&str]) -> InputDataset {
        let paths: Vec<PathBuf> = files
            .iter()
            .map(|f| {
                let p = dir.path().join(f);
                fs::write(&p, "data").unwrap();
                p
            })
            .collect();
        InputDataset::new(name, kind, paths)
    }

    fn namelist(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("marine.in");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn partitions_land_in_the_partitioned_directory() {
        let dir = TempDir::new().unwrap();
        let nl = namelist(&dir, "grid: __GRID_FILE_PLACEHOLDER__\n");
        let mut datasets = vec![dataset(&dir, "grid", DatasetKind::ModelGrid, &["grid.nc"])];
        let disc = Discretization::new(60, 2, 3).unwrap();

        prepare_run(&nl, &mut datasets, &disc, &FakePartitioner::new(), None, None).unwrap();

        let parted = datasets[0].partitioned_files();
        assert_eq!(parted.len(), 6);
        for p in parted {
            assert!(p.starts_with(dir.path().join("PARTITIONED")));
            assert!(p.is_file());
        }
        let resolved = fs::read_to_string(&nl).unwrap();
        assert!(resolved.contains("PARTITIONED"));
        assert!(!resolved.contains(GRID_FILE));
    }

    #[test]
    fn unmaterialized_dataset_aborts_the_stage() {
        let dir = TempDir::new().unwrap();
        let nl = namelist(&dir, "x");
        let mut datasets = vec![InputDataset::new(
            "ic",
            DatasetKind::InitialConditions,
            vec![dir.path().join("missing.nc")],
        )];
        let disc = Discretization::new(60, 1, 1).unwrap();
        let err = prepare_run(&nl, &mut datasets, &disc, &FakePartitioner::new(), None, None)
            .unwrap_err();
        match err {
            PipelineError::Precondition(msg) => assert!(msg.contains("ic")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn multiple_files_on_a_singular_kind_are_fatal() {
        let dir = TempDir::new().unwrap();
        let nl = namelist(&dir, "x");
        let mut datasets = vec![dataset(
            &dir,
            "grid",
            DatasetKind::ModelGrid,
            &["a.nc", "b.nc"],
        )];
        let disc = Discretization::new(60, 1, 1).unwrap();
        assert!(matches!(
            prepare_run(&nl, &mut datasets, &disc, &FakePartitioner::new(), None, None),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn forcing_block_keeps_dataset_then_file_order() {
        let dir = TempDir::new().unwrap();
        let nl = namelist(&dir, "forcing:\n__FORCING_FILES_PLACEHOLDER__");
        let mut datasets = vec![
            dataset(&dir, "bry_a", DatasetKind::BoundaryForcing, &["bry_a.nc"]),
            dataset(&dir, "bry_b", DatasetKind::BoundaryForcing, &["bry_b.nc"]),
        ];
        let disc = Discretization::new(60, 1, 2).unwrap();

        prepare_run(&nl, &mut datasets, &disc, &FakePartitioner::new(), None, None).unwrap();

        let resolved = fs::read_to_string(&nl).unwrap();
        let a = resolved.find("bry_a.nc").unwrap();
        let b = resolved.find("bry_b.nc").unwrap();
        assert!(a < b);
        let lines: Vec<&str> = resolved
            .lines()
            .filter(|l| l.contains("PARTITIONED"))
            .collect();
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn missing_bgc_companion_is_a_missing_dependency() {
        let dir = TempDir::new().unwrap();
        let nl = namelist(&dir, "bgc: __BGC_SETTINGS_FILE_PLACEHOLDER__\n");
        let mut datasets = vec![];
        let disc = Discretization::new(60, 1, 1).unwrap();
        let err = prepare_run(&nl, &mut datasets, &disc, &FakePartitioner::new(), None, None)
            .unwrap_err();
        match err {
            PipelineError::MissingDependency { path } => {
                assert_eq!(path, dir.path().join("bgc.in"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn present_bgc_companion_is_substituted() {
        let dir = TempDir::new().unwrap();
        let nl = namelist(&dir, "bgc: __BGC_SETTINGS_FILE_PLACEHOLDER__\n");
        fs::write(dir.path().join("bgc.in"), "settings").unwrap();
        let mut datasets = vec![];
        let disc = Discretization::new(60, 1, 1).unwrap();
        prepare_run(&nl, &mut datasets, &disc, &FakePartitioner::new(), None, None).unwrap();
        let resolved = fs::read_to_string(&nl).unwrap();
        assert!(resolved.contains("bgc.in"));
        assert!(!resolved.contains(BGC_SETTINGS_FILE));
    }

    #[test]
    fn datasets_outside_the_interval_are_skipped() {
        use chrono::TimeZone;
        let dir = TempDir::new().unwrap();
        let nl = namelist(&dir, "__FORCING_FILES_PLACEHOLDER__");
        let d = |y| Utc.with_ymd_and_hms(y, 1, 1, 0, 0, 0).unwrap();
        let mut datasets = vec![
            dataset(&dir, "old", DatasetKind::SurfaceForcing, &["old.nc"]).with_validity(
                d(2000),
                d(2001),
            ),
        ];
        let disc = Discretization::new(60, 1, 1).unwrap();
        let tool = FakePartitioner::new();
        prepare_run(&nl, &mut datasets, &disc, &tool, Some(d(2012)), Some(d(2013))).unwrap();
        assert!(tool.calls.lock().unwrap().is_empty());
        assert!(!datasets[0].is_partitioned());
    }
}
