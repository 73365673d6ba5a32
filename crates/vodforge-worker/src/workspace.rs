//! Per-job scratch directory.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Process-local scratch directory for one job.
///
/// Holds the downloaded source and the encoder output. Removed
/// recursively (best-effort) on drop, whatever the job outcome, so disk
/// usage does not grow across jobs on a long-lived worker.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh workspace under the worker's work directory.
    pub fn create(work_dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(work_dir)?;
        let dir = tempfile::Builder::new().prefix("job-").tempdir_in(work_dir)?;
        Ok(Self { dir })
    }

    /// Path the source object is downloaded to.
    pub fn input_path(&self) -> PathBuf {
        self.dir.path().join("input.mp4")
    }

    /// Directory the encoder writes the rendition set into.
    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("output")
    }

    /// Root of the workspace.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let job_path;
        {
            let workspace = Workspace::create(root.path()).unwrap();
            job_path = workspace.path().to_path_buf();
            std::fs::create_dir_all(workspace.output_dir()).unwrap();
            std::fs::write(workspace.input_path(), b"source").unwrap();
            assert!(job_path.exists());
        }
        assert!(!job_path.exists());
    }

    #[test]
    fn test_workspaces_are_distinct() {
        let root = tempfile::tempdir().unwrap();
        let a = Workspace::create(root.path()).unwrap();
        let b = Workspace::create(root.path()).unwrap();
        assert_ne!(a.path(), b.path());
    }
}
