//! Entry filtering
//!
//! This module decides whether a regular file matches the configured
//! criteria. Cheap checks run first; the file is only opened and stat'ed
//! when a size or link-count criterion needs it.

use std::ffi::OsStr;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use log::trace;

use super::criteria::FilterCriteria;
use super::dirent::{DirHandle, RawEntry};
use crate::errors::{FindError, FindResult};

/// Size and hard-link count of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStatus {
    pub size: u64,
    pub nlinks: u64,
}

/// Open `name` read-only relative to `dir` and read its status.
///
/// `dir_path` is only used to name the file in errors. The file is closed
/// before this returns, whether or not the stat succeeded.
pub fn fetch_status(dir: &DirHandle, name: &OsStr, dir_path: &Path) -> FindResult<FileStatus> {
    let file = dir.open_file(name).map_err(|source| FindError::OpenFile {
        path: dir_path.join(name),
        source,
    })?;

    let metadata = file.metadata().map_err(|source| FindError::Stat {
        path: dir_path.join(name),
        source,
    })?;

    Ok(FileStatus {
        size: metadata.size(),
        nlinks: metadata.nlink(),
    })
}

/// Filter for matching directory entries against FilterCriteria
#[derive(Debug, Clone, Copy)]
pub struct EntryFilter<'a> {
    criteria: &'a FilterCriteria,
}

impl<'a> EntryFilter<'a> {
    /// Create a new EntryFilter
    pub fn new(criteria: &'a FilterCriteria) -> Self {
        Self { criteria }
    }

    /// Check if the entry matches every configured criterion.
    ///
    /// An error means the file's status could not be read; the caller
    /// reports it and treats the entry as not matching.
    pub fn matches(&self, entry: &RawEntry, dir: &DirHandle, dir_path: &Path) -> FindResult<bool> {
        let criteria = self.criteria;

        if let Some(inode) = criteria.inode {
            if entry.inode() != inode {
                return Ok(false);
            }
        }

        if let Some(name) = &criteria.name {
            if entry.name() != name.as_os_str() {
                return Ok(false);
            }
        }

        if !criteria.needs_metadata() {
            return Ok(true);
        }

        let status = fetch_status(dir, entry.name(), dir_path)?;
        trace!(
            "{}: size {}, {} links",
            dir_path.join(entry.name()).display(),
            status.size,
            status.nlinks
        );

        Ok(self.matches_status(&status))
    }

    /// Check the metadata-based criteria against a fetched status
    pub fn matches_status(&self, status: &FileStatus) -> bool {
        if let Some(size) = &self.criteria.size {
            if !size.accepts(status.size) {
                return false;
            }
        }

        if let Some(nlinks) = self.criteria.nlinks {
            if status.nlinks != nlinks {
                return false;
            }
        }

        true
    }

    /// Get the filter description
    pub fn description(&self) -> String {
        self.criteria.description()
    }
}
