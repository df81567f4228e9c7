//! Filter criteria
//!
//! This module provides the immutable set of criteria a regular file must
//! satisfy to be reported.

use std::ffi::{OsStr, OsString};
use std::str::FromStr;

use crate::errors::{FindError, FindResult};

/// How a file size is compared against a threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeMode {
    /// Passes when the size is not greater than the threshold
    Less,
    /// Passes only on exact equality
    Equal,
    /// Passes when the size is not less than the threshold
    Greater,
}

/// A size comparison: mode plus threshold in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeFilter {
    pub mode: SizeMode,
    pub threshold: u64,
}

impl SizeFilter {
    /// Create a new SizeFilter
    pub fn new(mode: SizeMode, threshold: u64) -> Self {
        Self { mode, threshold }
    }

    /// Check a file size against this comparison.
    ///
    /// Both `Less` and `Greater` include the threshold itself.
    pub fn accepts(&self, size: u64) -> bool {
        match self.mode {
            SizeMode::Less => size <= self.threshold,
            SizeMode::Equal => size == self.threshold,
            SizeMode::Greater => size >= self.threshold,
        }
    }
}

impl FromStr for SizeFilter {
    type Err = FindError;

    /// Parse `-N`, `=N`, `+N` or a bare `N` (equal)
    fn from_str(s: &str) -> FindResult<Self> {
        let (mode, digits) = match s.as_bytes().first() {
            Some(b'-') => (SizeMode::Less, &s[1..]),
            Some(b'=') => (SizeMode::Equal, &s[1..]),
            Some(b'+') => (SizeMode::Greater, &s[1..]),
            _ => (SizeMode::Equal, s),
        };

        let threshold = digits
            .parse::<u64>()
            .map_err(|_| FindError::InvalidSize(s.to_string()))?;

        Ok(Self::new(mode, threshold))
    }
}

/// Criteria for selecting regular files
///
/// Every field is optional. A file matches when it satisfies all the
/// fields that are set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Inode number the entry must have
    pub inode: Option<u64>,

    /// Exact file name the entry must have
    pub name: Option<OsString>,

    /// Size comparison
    pub size: Option<SizeFilter>,

    /// Exact hard-link count
    pub nlinks: Option<u64>,
}

impl FilterCriteria {
    /// Create criteria that match every regular file
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the inode number (0 leaves it unset)
    pub fn with_inode(mut self, inode: u64) -> Self {
        self.inode = (inode != 0).then_some(inode);
        self
    }

    /// Set the exact file name (empty leaves it unset)
    pub fn with_name<S: AsRef<OsStr>>(mut self, name: S) -> Self {
        let name = name.as_ref();
        self.name = (!name.is_empty()).then(|| name.to_os_string());
        self
    }

    /// Set the size comparison
    pub fn with_size(mut self, size: SizeFilter) -> Self {
        self.size = Some(size);
        self
    }

    /// Set the hard-link count (0 leaves it unset)
    pub fn with_nlinks(mut self, nlinks: u64) -> Self {
        self.nlinks = (nlinks != 0).then_some(nlinks);
        self
    }

    /// Whether evaluating these criteria needs the file's status
    pub fn needs_metadata(&self) -> bool {
        self.size.is_some() || self.nlinks.is_some()
    }

    /// Get the criteria description
    pub fn description(&self) -> String {
        let mut parts = Vec::new();

        if let Some(inode) = self.inode {
            parts.push(format!("inode is {}", inode));
        }
        if let Some(name) = &self.name {
            parts.push(format!("name is '{}'", name.to_string_lossy()));
        }
        if let Some(size) = &self.size {
            let op = match size.mode {
                SizeMode::Less => "<=",
                SizeMode::Equal => "==",
                SizeMode::Greater => ">=",
            };
            parts.push(format!("size {} {}", op, size.threshold));
        }
        if let Some(nlinks) = self.nlinks {
            parts.push(format!("link count is {}", nlinks));
        }

        if parts.is_empty() {
            "any regular file".to_string()
        } else {
            parts.join(" and ")
        }
    }
}
