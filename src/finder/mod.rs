//! 文件查找模块
//!
//! 这个模块基于 getdents64 直接读取目录项，递归遍历目录树，
//! 并只在需要时读取文件元数据。

pub mod criteria;
pub mod dirent;
pub mod filter;
pub mod walker;

use std::path::Path;
use std::time::Instant;

use log::{debug, info};

use crate::errors::{FindError, FindResult};

pub use self::criteria::{FilterCriteria, SizeFilter, SizeMode};
pub use self::dirent::{DirHandle, EntryKind, RawEntry};
pub use self::filter::{EntryFilter, FileStatus};
pub use self::walker::{FileWalker, WalkReport};

/// 文件查找器
///
/// 在根目录下查找满足全部条件的普通文件。
#[derive(Debug, Clone, Default)]
pub struct Finder {
    criteria: FilterCriteria,
}

impl Finder {
    /// 创建新的文件查找器实例
    pub fn new(criteria: FilterCriteria) -> Self {
        Self { criteria }
    }

    /// 在指定目录中查找符合条件的文件
    ///
    /// 只有根目录无法打开时才返回错误；遍历中的错误记录在
    /// `WalkReport::errors` 中。返回的路径相对于 `root`。
    pub fn find<P: AsRef<Path>>(&self, root: P) -> FindResult<WalkReport> {
        let root = root.as_ref();
        let dir = DirHandle::open(root).map_err(|source| FindError::ReadDir {
            path: root.to_path_buf(),
            source,
        })?;

        let filter = EntryFilter::new(&self.criteria);
        info!("Starting search in {}", root.display());
        debug!("Filter: {}", filter.description());
        let start_time = Instant::now();

        let mut report = WalkReport::new();
        FileWalker::new(root, filter).walk(&dir, Path::new(""), &mut report);

        info!(
            "Search finished in {:.2?}: {} matches, {} errors",
            start_time.elapsed(),
            report.matches.len(),
            report.errors.len()
        );
        Ok(report)
    }
}
