//! Input dataset model.
//!
//! A logical input dataset (grid, initial conditions, or one of the
//! forcing families) materializes as one local file or an ordered list of
//! co-located files. After the pre-run stage it additionally carries the
//! ordered list of per-worker partition files written into a
//! `PARTITIONED` sibling directory.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{PipelineError, Result};

/// Name of the subdirectory holding per-worker partition files, both for
/// partitioned inputs and for consumed output partitions after a join.
pub const PARTITIONED_DIR: &str = "PARTITIONED";

/// The role a dataset plays in the model configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    /// The model grid. Singular: exactly one backing file.
    ModelGrid,
    /// Initial conditions. Singular: exactly one backing file.
    InitialConditions,
    /// Tidal forcing (multi-valued forcing family).
    TidalForcing,
    /// Surface forcing (multi-valued forcing family).
    SurfaceForcing,
    /// Open-boundary forcing (multi-valued forcing family).
    BoundaryForcing,
}

impl DatasetKind {
    /// Whether the model accepts only a single backing file of this kind.
    pub fn is_singular(self) -> bool {
        matches!(self, DatasetKind::ModelGrid | DatasetKind::InitialConditions)
    }

    /// Whether this kind contributes lines to the forcing-files block.
    pub fn is_forcing(self) -> bool {
        matches!(
            self,
            DatasetKind::TidalForcing | DatasetKind::SurfaceForcing | DatasetKind::BoundaryForcing
        )
    }

    /// Human-readable kind name used in diagnostics.
    pub fn display(self) -> &'static str {
        match self {
            DatasetKind::ModelGrid => "model grid",
            DatasetKind::InitialConditions => "initial conditions",
            DatasetKind::TidalForcing => "tidal forcing",
            DatasetKind::SurfaceForcing => "surface forcing",
            DatasetKind::BoundaryForcing => "boundary forcing",
        }
    }
}

/// A logical input dataset and its local materialization.
#[derive(Debug, Clone)]
pub struct InputDataset {
    name: String,
    kind: DatasetKind,
    working_paths: Vec<PathBuf>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    partitioned_files: Vec<PathBuf>,
}

impl InputDataset {
    /// Creates a dataset backed by the given local file paths.
    ///
    /// An empty path list means the dataset has not been materialized
    /// locally (fetching is an external step).
    pub fn new(name: impl Into<String>, kind: DatasetKind, working_paths: Vec<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind,
            working_paths,
            start_date: None,
            end_date: None,
            partitioned_files: Vec::new(),
        }
    }

    /// Attaches a validity interval used for date-range eligibility.
    pub fn with_validity(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    /// The local files backing this dataset, in order.
    pub fn working_paths(&self) -> &[PathBuf] {
        &self.working_paths
    }

    /// Whether every backing file exists on the local filesystem.
    pub fn exists_locally(&self) -> bool {
        !self.working_paths.is_empty() && self.working_paths.iter().all(|p| p.is_file())
    }

    /// Whether this dataset's validity interval overlaps the requested
    /// simulation interval. Open-ended on either side counts as overlap,
    /// matching "all datasets when no date filter applies".
    pub fn overlaps(&self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> bool {
        match (self.start_date, self.end_date, start, end) {
            (Some(ds_start), Some(ds_end), Some(start), Some(end)) => {
                ds_start <= end && ds_end >= start
            }
            _ => true,
        }
    }

    /// The common parent directory of all backing files.
    ///
    /// # Errors
    ///
    /// Returns a layout error when the backing files span multiple
    /// directories, and a precondition error when there are none.
    pub fn parent_dir(&self) -> Result<&Path> {
        let first = self.working_paths.first().ok_or_else(|| {
            PipelineError::Precondition(format!(
                "dataset '{}' has no local working path; fetch it first",
                self.name
            ))
        })?;
        let parent = first.parent().ok_or_else(|| {
            PipelineError::Precondition(format!(
                "dataset '{}' path '{}' has no parent directory",
                self.name,
                first.display()
            ))
        })?;
        if self
            .working_paths
            .iter()
            .any(|p| p.parent() != Some(parent))
        {
            return Err(PipelineError::InconsistentLayout {
                dataset: self.name.clone(),
                paths: self.working_paths.clone(),
            });
        }
        Ok(parent)
    }

    /// The `PARTITIONED` directory sibling to this dataset's files.
    pub fn partition_dir(&self) -> Result<PathBuf> {
        Ok(self.parent_dir()?.join(PARTITIONED_DIR))
    }

    /// Ordered per-worker partition files, populated by the pre-run stage.
    pub fn partitioned_files(&self) -> &[PathBuf] {
        &self.partitioned_files
    }

    /// Whether this dataset has already been partitioned in this run.
    pub fn is_partitioned(&self) -> bool {
        !self.partitioned_files.is_empty()
    }

    pub(crate) fn set_partitioned_files(&mut self, files: Vec<PathBuf>) {
        self.partitioned_files = files;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn exists_locally_requires_every_backing_file() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.nc");
        let b = dir.path().join("b.nc");
        fs::write(&a, "x").unwrap();

        let ds = InputDataset::new("bry", DatasetKind::BoundaryForcing, vec![a.clone(), b]);
        assert!(!ds.exists_locally());

        let ds = InputDataset::new("bry", DatasetKind::BoundaryForcing, vec![a]);
        assert!(ds.exists_locally());
    }

    #[test]
    fn unmaterialized_dataset_does_not_exist_locally() {
        let ds = InputDataset::new("grid", DatasetKind::ModelGrid, vec![]);
        assert!(!ds.exists_locally());
    }

    #[test]
    fn overlap_is_true_when_either_interval_is_open() {
        let ds = InputDataset::new("frc", DatasetKind::SurfaceForcing, vec![]);
        assert!(ds.overlaps(Some(utc(2012, 1, 1)), Some(utc(2012, 2, 1))));
        let ds = ds.with_validity(utc(2012, 1, 1), utc(2012, 1, 31));
        assert!(ds.overlaps(None, None));
    }

    #[test]
    fn overlap_respects_closed_intervals() {
        let ds = InputDataset::new("frc", DatasetKind::SurfaceForcing, vec![])
            .with_validity(utc(2012, 1, 1), utc(2012, 1, 31));
        assert!(ds.overlaps(Some(utc(2012, 1, 15)), Some(utc(2012, 2, 15))));
        assert!(!ds.overlaps(Some(utc(2012, 3, 1)), Some(utc(2012, 4, 1))));
    }

    #[test]
    fn parent_dir_rejects_files_in_different_directories() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        let ds = InputDataset::new(
            "bry",
            DatasetKind::BoundaryForcing,
            vec![dir.path().join("a.nc"), sub.join("b.nc")],
        );
        assert!(matches!(
            ds.parent_dir(),
            Err(PipelineError::InconsistentLayout { .. })
        ));
    }

    #[test]
    fn partition_dir_is_a_sibling_of_the_backing_files() {
        let dir = TempDir::new().unwrap();
        let ds = InputDataset::new(
            "grid",
            DatasetKind::ModelGrid,
            vec![dir.path().join("grid.nc")],
        );
        assert_eq!(
            ds.partition_dir().unwrap(),
            dir.path().join(PARTITIONED_DIR)
        );
    }
}
