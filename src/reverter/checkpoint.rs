//! On-disk checkpoint directory model: `FILEPATHS`, `NEW_FILES`,
//! `CHANGES_SINCE`, and the numbered capture files `0, 1, 2, ...`.
//!
//! Every function here operates on a single checkpoint directory and knows
//! nothing about whether that directory is the temp checkpoint, the
//! in-progress permanent checkpoint, or a finalized one — that distinction
//! lives in `reverter::Reverter`.

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use filetime::FileTime;

use super::error::{ReverterError, Result};

/// Fixed width for zero-padded finalized checkpoint names, chosen so that
/// lexicographic and numeric ordering coincide.
pub const CHECKPOINT_NAME_WIDTH: usize = 10;

/// Well-known directory name for the in-progress permanent checkpoint.
pub const IN_PROGRESS_DIR: &str = ".checkpoint_in_progress";

fn filepaths_file(checkpoint_dir: &Path) -> PathBuf {
    checkpoint_dir.join("FILEPATHS")
}

fn new_files_file(checkpoint_dir: &Path) -> PathBuf {
    checkpoint_dir.join("NEW_FILES")
}

fn changes_since_file(checkpoint_dir: &Path) -> PathBuf {
    checkpoint_dir.join("CHANGES_SINCE")
}

fn io_err(path: &Path, source: std::io::Error) -> ReverterError {
    ReverterError::io(path, source)
}

/// Ensure the checkpoint directory (and its parents) exists.
pub fn ensure_dir(checkpoint_dir: &Path) -> Result<()> {
    fs::create_dir_all(checkpoint_dir).map_err(|e| io_err(checkpoint_dir, e))
}

/// Read the ordered list of original paths captured in this checkpoint.
/// Returns an empty vec if `FILEPATHS` doesn't exist yet.
pub fn read_filepaths(checkpoint_dir: &Path) -> Result<Vec<PathBuf>> {
    read_lines(&filepaths_file(checkpoint_dir))
}

/// Read the ordered list of paths registered for creation in this
/// checkpoint. Returns an empty vec if `NEW_FILES` doesn't exist yet.
pub fn read_new_files(checkpoint_dir: &Path) -> Result<Vec<PathBuf>> {
    read_lines(&new_files_file(checkpoint_dir))
}

fn read_lines(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = fs::File::open(path).map_err(|e| io_err(path, e))?;
    BufReader::new(file)
        .lines()
        .filter(|line| !matches!(line, Ok(l) if l.is_empty()))
        .map(|line| line.map(PathBuf::from).map_err(|e| io_err(path, e)))
        .collect()
}

/// Capture `source`'s current content into checkpoint slot `index` and
/// append its path to `FILEPATHS`. Caller is responsible for having
/// checked that `source` is not already recorded (invariant 2) and is not
/// registered under `NEW_FILES` (invariant 4).
pub fn capture_file(checkpoint_dir: &Path, index: usize, source: &Path) -> Result<()> {
    let dest = checkpoint_dir.join(index.to_string());
    fs::copy(source, &dest).map_err(|e| io_err(source, e))?;

    if let Ok(metadata) = fs::metadata(source) {
        let mtime = FileTime::from_last_modification_time(&metadata);
        let atime = FileTime::from_last_access_time(&metadata);
        let _ = filetime::set_file_times(&dest, atime, mtime);
    }

    append_line(&filepaths_file(checkpoint_dir), source)
}

/// Append a path to `NEW_FILES`. Caller is responsible for deduplication.
pub fn append_new_file(checkpoint_dir: &Path, path: &Path) -> Result<()> {
    append_line(&new_files_file(checkpoint_dir), path)
}

fn append_line(path: &Path, value: &Path) -> Result<()> {
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| io_err(path, e))?;
    writeln!(file, "{}", value.display()).map_err(|e| io_err(path, e))
}

/// Append free-form notes verbatim (no separator inserted) to
/// `CHANGES_SINCE`.
pub fn append_notes(checkpoint_dir: &Path, notes: &str) -> Result<()> {
    let path = changes_since_file(checkpoint_dir);
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| io_err(&path, e))?;
    file.write_all(notes.as_bytes())
        .map_err(|e| io_err(&path, e))
}

/// Prepend `title` plus a newline ahead of any existing `CHANGES_SINCE`
/// content, so the title becomes the first line.
pub fn prepend_title(checkpoint_dir: &Path, title: &str) -> Result<()> {
    let path = changes_since_file(checkpoint_dir);
    let existing = fs::read_to_string(&path).unwrap_or_default();
    let mut combined = String::with_capacity(title.len() + 1 + existing.len());
    combined.push_str(title);
    combined.push('\n');
    combined.push_str(&existing);
    fs::write(&path, combined).map_err(|e| io_err(&path, e))
}

/// Read the raw `CHANGES_SINCE` contents (empty string if absent).
pub fn read_notes(checkpoint_dir: &Path) -> Result<String> {
    let path = changes_since_file(checkpoint_dir);
    if !path.exists() {
        return Ok(String::new());
    }
    fs::read_to_string(&path).map_err(|e| io_err(&path, e))
}

/// Remove the checkpoint directory and everything under it.
pub fn remove_dir(checkpoint_dir: &Path) -> Result<()> {
    if checkpoint_dir.exists() {
        fs::remove_dir_all(checkpoint_dir).map_err(|e| io_err(checkpoint_dir, e))?;
    }
    Ok(())
}

/// The path to capture slot `index` inside a checkpoint directory.
pub fn slot_path(checkpoint_dir: &Path, index: usize) -> PathBuf {
    checkpoint_dir.join(index.to_string())
}

/// Format a checkpoint index as a fixed-width, zero-padded directory name.
pub fn format_checkpoint_name(index: u64) -> String {
    format!("{:0width$}", index, width = CHECKPOINT_NAME_WIDTH)
}

/// List every finalized checkpoint directory under `backup_root`, sorted
/// oldest-first. An entry that is neither numeric nor `IN_PROGRESS_DIR` is
/// an inconsistent store and surfaces as an error.
pub fn list_finalized(backup_root: &Path) -> Result<Vec<(u64, PathBuf)>> {
    if !backup_root.exists() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    let entries = fs::read_dir(backup_root).map_err(|e| io_err(backup_root, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(backup_root, e))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name == IN_PROGRESS_DIR {
            continue;
        }
        match name.parse::<u64>() {
            Ok(n) => found.push((n, path)),
            Err(_) => return Err(ReverterError::InconsistentBackupDir(path)),
        }
    }

    found.sort_by_key(|(n, _)| *n);
    Ok(found)
}

/// Compute the next numeric checkpoint name: one past the largest existing
/// finalized checkpoint, or `0` if none exist.
pub fn next_checkpoint_index(backup_root: &Path) -> Result<u64> {
    Ok(list_finalized(backup_root)?
        .last()
        .map(|(n, _)| n + 1)
        .unwrap_or(0))
}
