//! 目录树遍历功能
//!
//! 本模块递归读取原始目录项，对普通文件应用过滤器，并深入子目录。
//! 单个条目或子树的 I/O 错误只会被报告，不会中断整个遍历。

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use log::{debug, error};

use super::dirent::{DirHandle, EntryKind};
use super::filter::EntryFilter;
use crate::errors::FindError;

/// 一次遍历的结果：匹配的路径与遇到的非致命错误
#[derive(Debug, Default)]
pub struct WalkReport {
    /// 相对于根目录的匹配路径，按发现顺序排列
    pub matches: Vec<PathBuf>,
    /// 遍历过程中报告的错误，按发生顺序排列
    pub errors: Vec<FindError>,
}

impl WalkReport {
    /// 创建空的报告
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录并输出一个非致命错误
    pub fn report(&mut self, err: FindError) {
        error!("{}", err);
        self.errors.push(err);
    }

    /// 是否遍历过程中没有出错
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// 深度优先的目录树遍历器
pub struct FileWalker<'a> {
    root: &'a Path,
    filter: EntryFilter<'a>,
}

impl<'a> FileWalker<'a> {
    /// 创建新的 FileWalker
    ///
    /// `root` 只用于在错误信息中显示完整路径。
    pub fn new(root: &'a Path, filter: EntryFilter<'a>) -> Self {
        Self { root, filter }
    }

    /// 遍历已打开的目录，`prefix` 为该目录相对于根目录的路径
    pub fn walk(&self, dir: &DirHandle, prefix: &Path, report: &mut WalkReport) {
        let dir_path = self.root.join(prefix);

        for entry in dir.entries() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) => {
                    report.report(FindError::ReadDir {
                        path: dir_path,
                        source,
                    });
                    return;
                }
            };

            if entry.is_pseudo() {
                continue;
            }

            match entry.kind() {
                EntryKind::Directory => self.descend(dir, entry.name(), prefix, &dir_path, report),
                EntryKind::File => match self.filter.matches(&entry, dir, &dir_path) {
                    Ok(true) => report.matches.push(prefix.join(entry.name())),
                    Ok(false) => {}
                    Err(err) => report.report(err),
                },
                EntryKind::Symlink | EntryKind::Other => {
                    debug!("跳过非普通文件: {}", dir_path.join(entry.name()).display());
                }
            }
        }
    }

    /// 打开子目录并递归遍历；子目录句柄在返回时关闭
    fn descend(
        &self,
        dir: &DirHandle,
        name: &OsStr,
        prefix: &Path,
        dir_path: &Path,
        report: &mut WalkReport,
    ) {
        let child = match dir.open_child(name) {
            Ok(child) => child,
            Err(source) => {
                report.report(FindError::OpenDir {
                    path: dir_path.join(name),
                    source,
                });
                return;
            }
        };

        debug!("进入目录: {}", dir_path.join(name).display());
        self.walk(&child, &prefix.join(name), report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finder::criteria::{FilterCriteria, SizeFilter, SizeMode};
    use std::collections::BTreeSet;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn create_test_structure() -> std::io::Result<TempDir> {
        let temp_dir = TempDir::new()?;

        File::create(temp_dir.path().join("file1.txt"))?.write_all(b"test")?;
        fs::create_dir(temp_dir.path().join("dir1"))?;
        File::create(temp_dir.path().join("dir1").join("file2.txt"))?.write_all(b"test")?;
        fs::create_dir_all(temp_dir.path().join("dir1").join("nested").join("deep"))?;
        File::create(temp_dir.path().join("dir1/nested/deep/file1.txt"))?
            .write_all(b"a longer body")?;
        fs::create_dir(temp_dir.path().join("empty"))?;

        Ok(temp_dir)
    }

    fn walk_with(root: &Path, criteria: &FilterCriteria) -> std::io::Result<WalkReport> {
        let dir = DirHandle::open(root)?;
        let walker = FileWalker::new(root, EntryFilter::new(criteria));
        let mut report = WalkReport::new();
        walker.walk(&dir, Path::new(""), &mut report);
        Ok(report)
    }

    fn as_set(paths: &[PathBuf]) -> BTreeSet<PathBuf> {
        paths.iter().cloned().collect()
    }

    #[test]
    fn test_walk_finds_every_regular_file() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = create_test_structure()?;
        let report = walk_with(temp_dir.path(), &FilterCriteria::new())?;

        assert!(report.is_clean());
        assert_eq!(report.matches.len(), 3);
        assert_eq!(
            as_set(&report.matches),
            BTreeSet::from([
                PathBuf::from("file1.txt"),
                PathBuf::from("dir1/file2.txt"),
                PathBuf::from("dir1/nested/deep/file1.txt"),
            ])
        );

        Ok(())
    }

    #[test]
    fn test_walk_agrees_with_walkdir() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = create_test_structure()?;
        for i in 0..30 {
            let sub = temp_dir.path().join(format!("bulk{}", i % 4));
            fs::create_dir_all(&sub)?;
            File::create(sub.join(format!("item_{}.dat", i)))?;
        }

        let expected: BTreeSet<PathBuf> = walkdir::WalkDir::new(temp_dir.path())
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().strip_prefix(temp_dir.path()).unwrap().to_path_buf())
            .collect();

        let report = walk_with(temp_dir.path(), &FilterCriteria::new())?;
        assert_eq!(report.matches.len(), expected.len());
        assert_eq!(as_set(&report.matches), expected);

        Ok(())
    }

    #[test]
    fn test_walk_is_deterministic() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = create_test_structure()?;
        let first = walk_with(temp_dir.path(), &FilterCriteria::new())?;
        let second = walk_with(temp_dir.path(), &FilterCriteria::new())?;
        assert_eq!(first.matches, second.matches);
        Ok(())
    }

    /// Regular files under `root/prefix` in directory-stream order, with each
    /// subdirectory expanded where its entry appears
    fn stream_order(root: &Path, prefix: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
        let dir = DirHandle::open(root.join(prefix))?;
        for entry in dir.entries() {
            let entry = entry?;
            if entry.is_pseudo() {
                continue;
            }
            match entry.kind() {
                EntryKind::File => out.push(prefix.join(entry.name())),
                EntryKind::Directory => stream_order(root, &prefix.join(entry.name()), out)?,
                _ => {}
            }
        }
        Ok(())
    }

    #[test]
    fn test_walk_is_preorder() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        for sub in ["a", "b", "c"] {
            fs::create_dir_all(temp_dir.path().join(sub).join("inner"))?;
            File::create(temp_dir.path().join(sub).join("one"))?;
            File::create(temp_dir.path().join(sub).join("inner").join("two"))?;
        }
        for i in 0..8 {
            File::create(temp_dir.path().join(format!("top_{}", i)))?;
        }

        let report = walk_with(temp_dir.path(), &FilterCriteria::new())?;
        assert_eq!(report.matches.len(), 14);

        let mut expected = Vec::new();
        stream_order(temp_dir.path(), Path::new(""), &mut expected)?;
        assert_eq!(report.matches, expected);

        // Each top-level subtree is emitted as one contiguous run
        let mut runs: Vec<_> = report
            .matches
            .iter()
            .filter(|p| p.components().count() > 1)
            .map(|p| p.components().next().unwrap().as_os_str().to_os_string())
            .collect();
        runs.dedup();
        assert_eq!(runs.len(), 3);

        Ok(())
    }

    #[test]
    fn test_walk_order_with_long_names() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        for i in 0..40 {
            let name = format!("{:03}{}", i, "n".repeat(247 + i % 6));
            if i % 5 == 0 {
                fs::create_dir(temp_dir.path().join(&name))?;
                File::create(temp_dir.path().join(&name).join("inside"))?;
            } else {
                File::create(temp_dir.path().join(&name))?;
            }
        }

        let report = walk_with(temp_dir.path(), &FilterCriteria::new())?;
        assert!(report.is_clean());
        assert_eq!(report.matches.len(), 40);

        let mut expected = Vec::new();
        stream_order(temp_dir.path(), Path::new(""), &mut expected)?;
        assert_eq!(report.matches, expected);

        Ok(())
    }

    #[test]
    fn test_walk_empty_dir() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let report = walk_with(temp_dir.path(), &FilterCriteria::new())?;
        assert!(report.matches.is_empty());
        assert!(report.is_clean());
        Ok(())
    }

    #[test]
    fn test_walk_name_filter_across_dirs() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = create_test_structure()?;
        let report = walk_with(temp_dir.path(), &FilterCriteria::new().with_name("file1.txt"))?;

        assert_eq!(
            as_set(&report.matches),
            BTreeSet::from([
                PathBuf::from("file1.txt"),
                PathBuf::from("dir1/nested/deep/file1.txt"),
            ])
        );

        Ok(())
    }

    #[test]
    fn test_walk_name_filter_ignores_directories() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = create_test_structure()?;
        let report = walk_with(temp_dir.path(), &FilterCriteria::new().with_name("dir1"))?;
        assert!(report.matches.is_empty());
        Ok(())
    }

    #[test]
    fn test_walk_inode_filter() -> Result<(), Box<dyn std::error::Error>> {
        use std::os::unix::fs::MetadataExt;

        let temp_dir = create_test_structure()?;
        let inode = fs::metadata(temp_dir.path().join("dir1/file2.txt"))?.ino();

        let report = walk_with(temp_dir.path(), &FilterCriteria::new().with_inode(inode))?;
        assert_eq!(report.matches, vec![PathBuf::from("dir1/file2.txt")]);

        Ok(())
    }

    #[test]
    fn test_walk_size_filter() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = create_test_structure()?;
        let criteria = FilterCriteria::new().with_size(SizeFilter::new(SizeMode::Greater, 5));

        let report = walk_with(temp_dir.path(), &criteria)?;
        assert_eq!(report.matches, vec![PathBuf::from("dir1/nested/deep/file1.txt")]);

        Ok(())
    }

    #[test]
    fn test_walk_nlinks_filter() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = create_test_structure()?;
        fs::hard_link(
            temp_dir.path().join("file1.txt"),
            temp_dir.path().join("dir1").join("alias.txt"),
        )?;

        let report = walk_with(temp_dir.path(), &FilterCriteria::new().with_nlinks(2))?;
        assert_eq!(
            as_set(&report.matches),
            BTreeSet::from([PathBuf::from("file1.txt"), PathBuf::from("dir1/alias.txt")])
        );

        Ok(())
    }

    #[test]
    fn test_walk_skips_symlinks() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = create_test_structure()?;
        std::os::unix::fs::symlink("file1.txt", temp_dir.path().join("link.txt"))?;
        std::os::unix::fs::symlink("dir1", temp_dir.path().join("dirlink"))?;

        let report = walk_with(temp_dir.path(), &FilterCriteria::new())?;
        assert_eq!(report.matches.len(), 3);
        assert!(report
            .matches
            .iter()
            .all(|p| !p.starts_with("dirlink") && p != Path::new("link.txt")));

        Ok(())
    }

    #[test]
    fn test_walk_reports_unreadable_dir() -> Result<(), Box<dyn std::error::Error>> {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = create_test_structure()?;
        let restricted = temp_dir.path().join("restricted");
        fs::create_dir(&restricted)?;
        File::create(restricted.join("hidden.txt"))?;
        fs::set_permissions(&restricted, fs::Permissions::from_mode(0o000))?;

        // Privileged users can still read the directory
        if fs::read_dir(&restricted).is_ok() {
            eprintln!("Warning: permission bits are not enforced for this user, skipping");
            fs::set_permissions(&restricted, fs::Permissions::from_mode(0o755))?;
            return Ok(());
        }

        let report = walk_with(temp_dir.path(), &FilterCriteria::new())?;
        fs::set_permissions(&restricted, fs::Permissions::from_mode(0o755))?;

        assert_eq!(report.matches.len(), 3);
        assert_eq!(report.errors.len(), 1);
        match &report.errors[0] {
            FindError::OpenDir { path, .. } => assert_eq!(path, &restricted),
            other => panic!("Expected OpenDir, got {:?}", other),
        }

        Ok(())
    }

    #[test]
    fn test_walk_reports_unreadable_file_when_stat_needed() -> Result<(), Box<dyn std::error::Error>> {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = create_test_structure()?;
        let secret = temp_dir.path().join("dir1").join("secret.txt");
        File::create(&secret)?.write_all(b"0123456789")?;
        fs::set_permissions(&secret, fs::Permissions::from_mode(0o000))?;

        if File::open(&secret).is_ok() {
            eprintln!("Warning: permission bits are not enforced for this user, skipping");
            return Ok(());
        }

        // Without a metadata criterion the file is never opened
        let report = walk_with(temp_dir.path(), &FilterCriteria::new())?;
        assert_eq!(report.matches.len(), 4);
        assert!(report.is_clean());

        let criteria = FilterCriteria::new().with_size(SizeFilter::new(SizeMode::Greater, 0));
        let report = walk_with(temp_dir.path(), &criteria)?;
        assert_eq!(report.matches.len(), 3);
        assert_eq!(report.errors.len(), 1);
        assert!(matches!(
            &report.errors[0],
            FindError::OpenFile { path, .. } if path == &secret
        ));

        Ok(())
    }

    #[test]
    fn test_walk_continues_after_vanished_subdir() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = create_test_structure()?;
        fs::create_dir(temp_dir.path().join("vanished"))?;

        let dir = DirHandle::open(temp_dir.path())?;
        let criteria = FilterCriteria::new();
        let walker = FileWalker::new(temp_dir.path(), EntryFilter::new(&criteria));
        let mut report = WalkReport::new();

        // The entry was listed, then removed before the walker opened it
        fs::remove_dir(temp_dir.path().join("vanished"))?;
        walker.descend(
            &dir,
            OsStr::new("vanished"),
            Path::new(""),
            temp_dir.path(),
            &mut report,
        );
        walker.walk(&dir, Path::new(""), &mut report);

        assert_eq!(report.errors.len(), 1);
        match &report.errors[0] {
            FindError::OpenDir { path, source } => {
                assert_eq!(path, &temp_dir.path().join("vanished"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("Expected OpenDir, got {:?}", other),
        }
        assert_eq!(report.matches.len(), 3);

        Ok(())
    }

    #[test]
    fn test_walk_excludes_vanished_file_when_stat_needed() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = create_test_structure()?;
        let dir = DirHandle::open(temp_dir.path())?;
        let entry = DirHandle::open(temp_dir.path())?
            .entries()
            .filter_map(Result::ok)
            .find(|e| e.name() == OsStr::new("file1.txt"))
            .ok_or("entry not listed")?;
        fs::remove_file(temp_dir.path().join("file1.txt"))?;

        let criteria = FilterCriteria::new().with_nlinks(1);
        let filter = EntryFilter::new(&criteria);
        let err = filter.matches(&entry, &dir, temp_dir.path()).unwrap_err();
        assert!(err.is_traversal());

        let mut report = WalkReport::new();
        report.report(err);
        FileWalker::new(temp_dir.path(), filter).walk(&dir, Path::new(""), &mut report);

        assert_eq!(report.errors.len(), 1);
        assert_eq!(
            as_set(&report.matches),
            BTreeSet::from([
                PathBuf::from("dir1/file2.txt"),
                PathBuf::from("dir1/nested/deep/file1.txt"),
            ])
        );

        Ok(())
    }
}
