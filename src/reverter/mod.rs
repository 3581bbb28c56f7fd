//! The reverter subsystem: a persistent, crash-safe journal of file edits
//! and file-creation events.
//!
//! A [`Reverter`] is backed by three directories (`backup`, `temp`,
//! `progress`) supplied at construction, normally via [`crate::config::ReverterConfig`].
//! It performs only synchronous filesystem I/O and assumes a single thread
//! of control — see the crate-level docs for the crash-safety model.

pub mod checkpoint;
pub mod error;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use filetime::FileTime;

pub use error::{ReverterError, Result};

use crate::config::ReverterConfig;

/// Summary of one finalized checkpoint, as returned by
/// [`Reverter::view_config_changes`].
#[derive(Debug, Clone)]
pub struct CheckpointSummary {
    pub id: u64,
    pub modified: SystemTime,
    pub notes: String,
}

/// A validated, non-negative checkpoint count for [`Reverter::rollback_checkpoints`].
///
/// The original tool accepted either an integer or an integer-shaped string;
/// here that's expressed as a closed set of `TryFrom` conversions rather
/// than runtime type inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollbackCount(u64);

impl TryFrom<i64> for RollbackCount {
    type Error = ReverterError;

    fn try_from(value: i64) -> Result<Self> {
        if value < 0 {
            return Err(ReverterError::InvalidRollbackCount(value.to_string()));
        }
        Ok(RollbackCount(value as u64))
    }
}

impl TryFrom<u64> for RollbackCount {
    type Error = ReverterError;

    fn try_from(value: u64) -> Result<Self> {
        Ok(RollbackCount(value))
    }
}

impl TryFrom<&str> for RollbackCount {
    type Error = ReverterError;

    fn try_from(value: &str) -> Result<Self> {
        value
            .trim()
            .parse::<i64>()
            .map_err(|_| ReverterError::InvalidRollbackCount(value.to_string()))
            .and_then(RollbackCount::try_from)
    }
}

/// Crash-safe checkpoint/rollback facility over three on-disk directories.
pub struct Reverter {
    backup: PathBuf,
    temp: PathBuf,
    progress: PathBuf,
}

impl Reverter {
    /// Construct a reverter over the three directories named in `config`.
    /// No directory is created eagerly.
    pub fn new(config: &ReverterConfig) -> Self {
        Self {
            backup: config.backup.clone(),
            temp: config.temp.clone(),
            progress: config.progress.clone(),
        }
    }

    /// Construct directly from paths, bypassing [`ReverterConfig`]. Mainly
    /// useful for tests that want isolated temp directories.
    pub fn with_paths(backup: PathBuf, temp: PathBuf, progress: PathBuf) -> Self {
        Self {
            backup,
            temp,
            progress,
        }
    }

    fn io_err(path: &Path, source: std::io::Error) -> ReverterError {
        ReverterError::io(path, source)
    }

    /// Capture `paths` into the temporary checkpoint, discarded at the end
    /// of the run by [`Reverter::revert_temporary_config`].
    pub fn add_to_temp_checkpoint<P: AsRef<Path>>(&self, paths: &[P], notes: &str) -> Result<()> {
        let temp = self.temp.clone();
        self.add_to_checkpoint_dir(&temp, paths, notes)
    }

    /// Capture `paths` into the in-progress permanent checkpoint, promoted
    /// to a numbered checkpoint by [`Reverter::finalize_checkpoint`].
    pub fn add_to_checkpoint<P: AsRef<Path>>(&self, paths: &[P], notes: &str) -> Result<()> {
        let progress = self.progress.clone();
        self.add_to_checkpoint_dir(&progress, paths, notes)
    }

    fn add_to_checkpoint_dir<P: AsRef<Path>>(
        &self,
        dir: &Path,
        paths: &[P],
        notes: &str,
    ) -> Result<()> {
        checkpoint::ensure_dir(dir)?;

        let new_files: HashSet<PathBuf> = checkpoint::read_new_files(dir)?.into_iter().collect();
        for path in paths {
            let path = path.as_ref();
            if new_files.contains(path) {
                return Err(ReverterError::AlreadyRegisteredNew(path.to_path_buf()));
            }
        }

        let mut recorded: HashSet<PathBuf> = checkpoint::read_filepaths(dir)?.into_iter().collect();
        let mut next_index = recorded.len();
        for path in paths {
            let path = path.as_ref();
            if recorded.contains(path) {
                continue;
            }
            checkpoint::capture_file(dir, next_index, path)?;
            recorded.insert(path.to_path_buf());
            next_index += 1;
        }

        checkpoint::append_notes(dir, notes)
    }

    /// Register one or more paths the caller is about to create (or has
    /// just created), protected by rollback of the named checkpoint.
    /// Registration happens before creation so a crash in between leaves
    /// only a harmless dangling entry.
    pub fn register_file_creation<P: AsRef<Path>>(
        &self,
        temporary: bool,
        paths: &[P],
    ) -> Result<()> {
        if paths.is_empty() {
            return Err(ReverterError::BadRegistration);
        }

        let dir = if temporary { &self.temp } else { &self.progress };
        checkpoint::ensure_dir(dir)?;

        let mut existing: HashSet<PathBuf> = checkpoint::read_new_files(dir)?.into_iter().collect();
        for path in paths {
            let path = path.as_ref();
            if existing.insert(path.to_path_buf()) {
                checkpoint::append_new_file(dir, path)?;
            }
        }
        Ok(())
    }

    /// Promote the in-progress permanent checkpoint to a finalized,
    /// numbered checkpoint. Idempotent: warns and returns `Ok` if there is
    /// no in-progress checkpoint.
    pub fn finalize_checkpoint(&self, title: &str) -> Result<()> {
        if !self.progress.exists() {
            tracing::warn!("finalize_checkpoint called with no in-progress checkpoint");
            return Ok(());
        }

        checkpoint::prepend_title(&self.progress, title)?;

        let index = checkpoint::next_checkpoint_index(&self.backup)?;
        let dest = self.backup.join(checkpoint::format_checkpoint_name(index));

        fs::rename(&self.progress, &dest).map_err(|e| Self::io_err(&self.progress, e))
    }

    /// Undo everything recorded in the temporary checkpoint and remove it.
    pub fn revert_temporary_config(&self) -> Result<()> {
        if !self.temp.exists() {
            return Ok(());
        }
        self.recover_checkpoint(&self.temp)
    }

    /// Roll back the `count` most-recent finalized permanent checkpoints,
    /// newest first. `count` may be an `i64`, `u64`, or an integer-shaped
    /// `&str`; negative or non-numeric input is rejected.
    pub fn rollback_checkpoints<T>(&self, count: T) -> Result<()>
    where
        T: TryInto<RollbackCount, Error = ReverterError>,
    {
        let RollbackCount(n) = count.try_into()?;

        for _ in 0..n {
            let finalized = checkpoint::list_finalized(&self.backup)?;
            match finalized.last() {
                None => {
                    tracing::warn!("rollback_checkpoints: no more finalized checkpoints to roll back");
                    break;
                }
                Some((_, dir)) => self.recover_checkpoint(dir)?,
            }
        }
        Ok(())
    }

    /// Clean up any checkpoint left "in progress" by a crashed prior run.
    /// Finalized checkpoints are never touched.
    pub fn recovery_routine(&self) -> Result<()> {
        if self.progress.exists() {
            self.recover_checkpoint(&self.progress)?;
        }
        if self.temp.exists() {
            self.recover_checkpoint(&self.temp)?;
        }
        Ok(())
    }

    /// Enumerate finalized permanent checkpoints in chronological order.
    pub fn view_config_changes(&self) -> Result<Vec<CheckpointSummary>> {
        let finalized = checkpoint::list_finalized(&self.backup)?;

        if finalized.is_empty() {
            tracing::info!("no finalized checkpoints to show");
            return Ok(Vec::new());
        }

        finalized
            .into_iter()
            .map(|(id, dir)| {
                let modified = fs::metadata(&dir)
                    .and_then(|m| m.modified())
                    .map_err(|e| Self::io_err(&dir, e))?;
                let notes = checkpoint::read_notes(&dir)?;
                Ok(CheckpointSummary { id, modified, notes })
            })
            .collect()
    }

    /// Undo one checkpoint: delete its registered new files, restore its
    /// backed-up files, then remove the checkpoint directory. Deletion
    /// happens before restoration (see crate docs on ordering).
    fn recover_checkpoint(&self, dir: &Path) -> Result<()> {
        for path in checkpoint::read_new_files(dir)? {
            if !path.exists() {
                tracing::warn!(path = %path.display(), "new file already absent, skipping");
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::warn!(path = %path.display(), "new file vanished before removal");
                }
                Err(e) => return Err(Self::io_err(&path, e)),
            }
        }

        for (index, original) in checkpoint::read_filepaths(dir)?.into_iter().enumerate() {
            let slot = checkpoint::slot_path(dir, index);
            fs::copy(&slot, &original).map_err(|e| Self::io_err(&original, e))?;
            if let Ok(metadata) = fs::metadata(&slot) {
                let mtime = FileTime::from_last_modification_time(&metadata);
                let atime = FileTime::from_last_access_time(&metadata);
                let _ = filetime::set_file_times(&original, atime, mtime);
            }
        }

        checkpoint::remove_dir(dir)
    }
}

impl Default for Reverter {
    fn default() -> Self {
        Self::new(&ReverterConfig::load())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct Fixture {
        _work: tempfile::TempDir,
        reverter: Reverter,
        config1: PathBuf,
        config2: PathBuf,
        dir1: tempfile::TempDir,
        dir2: tempfile::TempDir,
    }

    fn setup() -> Fixture {
        let work = tempdir().unwrap();
        let backup = work.path().join("backup");
        let temp = work.path().join("temp");
        let progress = backup.join(checkpoint::IN_PROGRESS_DIR);

        let dir1 = tempdir().unwrap();
        let dir2 = tempdir().unwrap();
        let config1 = dir1.path().join("config.txt");
        let config2 = dir2.path().join("config.txt");
        fs::write(&config1, "directive-dir1").unwrap();
        fs::write(&config2, "directive-dir2").unwrap();

        Fixture {
            _work: work,
            reverter: Reverter::with_paths(backup, temp, progress),
            config1,
            config2,
            dir1,
            dir2,
        }
    }

    #[test]
    fn basic_add_to_temp_checkpoint() {
        let f = setup();
        f.reverter
            .add_to_temp_checkpoint(&[f.config1.clone()], "save1")
            .unwrap();
        f.reverter
            .add_to_temp_checkpoint(&[f.config2.clone()], "save2")
            .unwrap();

        let dir = f.reverter.temp.clone();
        assert!(dir.is_dir());
        assert_eq!(checkpoint::read_notes(&dir).unwrap(), "save1save2");
        assert!(!dir.join("NEW_FILES").exists());
        assert_eq!(
            checkpoint::read_filepaths(&dir).unwrap(),
            vec![f.config1.clone(), f.config2.clone()]
        );
    }

    #[test]
    fn repeat_capture_is_idempotent() {
        let f = setup();
        f.reverter
            .add_to_temp_checkpoint(&[f.config1.clone()], "a")
            .unwrap();
        f.reverter
            .add_to_temp_checkpoint(&[f.config1.clone()], "b")
            .unwrap();

        let dir = f.reverter.temp.clone();
        assert_eq!(checkpoint::read_filepaths(&dir).unwrap().len(), 1);
        assert_eq!(checkpoint::read_notes(&dir).unwrap(), "ab");
    }

    #[test]
    fn new_file_backup_conflict_is_per_checkpoint() {
        let f = setup();
        let config3 = f.dir1.path().join("config3.txt");

        f.reverter
            .register_file_creation(false, &[config3.clone()])
            .unwrap();

        let err = f
            .reverter
            .add_to_checkpoint(&[config3.clone()], "oops")
            .unwrap_err();
        assert!(matches!(err, ReverterError::AlreadyRegisteredNew(_)));

        fs::write(&config3, "new content").unwrap();
        f.reverter
            .add_to_temp_checkpoint(&[config3], "different checkpoint, ok")
            .unwrap();
    }

    #[test]
    fn multi_registration_dedups() {
        let f = setup();
        for _ in 0..4 {
            f.reverter
                .register_file_creation(true, &[f.config1.clone()])
                .unwrap();
        }
        let files = checkpoint::read_new_files(&f.reverter.temp).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn register_file_creation_rejects_empty() {
        let f = setup();
        let empty: [PathBuf; 0] = [];
        let err = f.reverter.register_file_creation(true, &empty).unwrap_err();
        assert!(matches!(err, ReverterError::BadRegistration));
    }

    #[test]
    fn revert_temporary_config_restores_originals() {
        let f = setup();
        f.reverter
            .add_to_temp_checkpoint(&[f.config1.clone(), f.config2.clone()], "save1")
            .unwrap();
        fs::write(&f.config1, "x").unwrap();
        fs::write(&f.config2, "x").unwrap();

        f.reverter.revert_temporary_config().unwrap();

        assert_eq!(fs::read_to_string(&f.config1).unwrap(), "directive-dir1");
        assert_eq!(fs::read_to_string(&f.config2).unwrap(), "directive-dir2");
        assert!(!f.reverter.temp.exists());
    }

    #[test]
    fn finalize_with_no_in_progress_warns_and_succeeds() {
        let f = setup();
        f.reverter.finalize_checkpoint("nothing to save").unwrap();
    }

    #[test]
    fn rollback_zero_is_noop() {
        let f = setup();
        f.reverter
            .add_to_checkpoint(&[f.config1.clone()], "save")
            .unwrap();
        f.reverter.finalize_checkpoint("Checkpoint").unwrap();
        f.reverter.rollback_checkpoints(0i64).unwrap();
        assert_eq!(
            checkpoint::list_finalized(&f.reverter.backup).unwrap().len(),
            1
        );
    }

    #[test]
    fn rollback_more_than_available_rolls_back_all() {
        let f = setup();
        f.reverter
            .add_to_checkpoint(&[f.config1.clone()], "save")
            .unwrap();
        f.reverter.finalize_checkpoint("Checkpoint").unwrap();

        f.reverter.rollback_checkpoints(5i64).unwrap();
        assert!(checkpoint::list_finalized(&f.reverter.backup)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn rollback_rejects_bad_input() {
        let f = setup();
        assert!(matches!(
            f.reverter.rollback_checkpoints("-1").unwrap_err(),
            ReverterError::InvalidRollbackCount(_)
        ));
        assert!(matches!(
            f.reverter.rollback_checkpoints(-1000i64).unwrap_err(),
            ReverterError::InvalidRollbackCount(_)
        ));
        assert!(matches!(
            f.reverter.rollback_checkpoints("one").unwrap_err(),
            ReverterError::InvalidRollbackCount(_)
        ));
    }

    #[test]
    fn staged_rollback_matches_scenario() {
        let f = setup();
        let config3 = f.dir1.path().join("config3.txt");

        f.reverter
            .add_to_checkpoint(&[f.config1.clone()], "first save")
            .unwrap();
        f.reverter.finalize_checkpoint("First Checkpoint").unwrap();
        fs::write(&f.config1, "update config1").unwrap();

        f.reverter
            .register_file_creation(false, &[config3.clone()])
            .unwrap();
        fs::write(&config3, "directive-config3").unwrap();
        f.reverter
            .add_to_checkpoint(&[f.config2.clone()], "second save")
            .unwrap();
        f.reverter.finalize_checkpoint("Second Checkpoint").unwrap();
        fs::write(&f.config2, "update config2").unwrap();
        fs::write(&config3, "update config3").unwrap();

        f.reverter
            .add_to_checkpoint(&[f.config1.clone(), f.config2.clone()], "third save")
            .unwrap();
        f.reverter
            .finalize_checkpoint("Third Checkpoint - Save both")
            .unwrap();
        fs::write(&f.config1, "Final form config1").unwrap();
        fs::write(&f.config2, "Final form config2").unwrap();
        fs::write(&config3, "Final form config3").unwrap();

        f.reverter.rollback_checkpoints(1i64).unwrap();
        assert_eq!(fs::read_to_string(&f.config1).unwrap(), "update config1");
        assert_eq!(fs::read_to_string(&f.config2).unwrap(), "update config2");
        assert_eq!(fs::read_to_string(&config3).unwrap(), "Final form config3");

        f.reverter.rollback_checkpoints(1i64).unwrap();
        assert_eq!(fs::read_to_string(&f.config1).unwrap(), "update config1");
        assert_eq!(fs::read_to_string(&f.config2).unwrap(), "directive-dir2");
        assert!(!config3.exists());

        f.reverter.rollback_checkpoints(1i64).unwrap();
        assert_eq!(fs::read_to_string(&f.config1).unwrap(), "directive-dir1");
    }

    #[test]
    fn crash_mid_run_recovered() {
        let f = setup();
        let config4 = f.dir2.path().join("config4.txt");

        f.reverter
            .add_to_checkpoint(&[f.config1.clone()], "perm save")
            .unwrap();

        f.reverter
            .add_to_temp_checkpoint(&[f.config1.clone()], "temp save")
            .unwrap();
        f.reverter.register_file_creation(true, &[config4.clone()]).unwrap();
        fs::write(&config4, "new temp file").unwrap();
        fs::write(&f.config1, "mutated after capture").unwrap();

        f.reverter.recovery_routine().unwrap();

        assert_eq!(fs::read_to_string(&f.config1).unwrap(), "directive-dir1");
        assert!(!config4.exists());
        assert!(!f.reverter.progress.exists());
        assert!(!f.reverter.temp.exists());
    }

    #[test]
    fn view_config_changes_reports_notes() {
        let f = setup();
        f.reverter
            .add_to_checkpoint(&[f.config1.clone()], "first save")
            .unwrap();
        f.reverter.finalize_checkpoint("First Checkpoint").unwrap();

        let summaries = f.reverter.view_config_changes().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].id, 0);
        assert!(summaries[0].notes.starts_with("First Checkpoint\n"));
    }

    #[test]
    fn view_config_changes_rejects_inconsistent_backup_dir() {
        let f = setup();
        fs::create_dir_all(f.reverter.backup.join("not_a_number")).unwrap();
        assert!(matches!(
            f.reverter.view_config_changes().unwrap_err(),
            ReverterError::InconsistentBackupDir(_)
        ));
    }
}
