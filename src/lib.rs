//! 按 inode、名称、大小和硬链接数查找文件的库
//!
//! 本库直接用 getdents64 读取目录项并递归遍历目录树：
//! - 只有普通文件参与匹配，符号链接和特殊文件会被跳过
//! - 只有设置了大小或硬链接数条件时才会打开文件读取元数据
//! - 单个目录或文件的 I/O 错误只会被报告，遍历继续进行
//!
//! # 示例
//!
//! 基本用法：
//! ```no_run
//! use os_find::finder::{Finder, FilterCriteria, SizeFilter, SizeMode};
//!
//! // 名为 notes.txt 且不小于 1024 字节的文件
//! let criteria = FilterCriteria::new()
//!     .with_name("notes.txt")
//!     .with_size(SizeFilter::new(SizeMode::Greater, 1024));
//!
//! let report = Finder::new(criteria).find(".").unwrap();
//!
//! // 路径相对于根目录
//! for path in &report.matches {
//!     println!("找到文件: {}", path.display());
//! }
//! ```

pub mod cli;
pub mod dispatch;
pub mod errors;
pub mod finder;

// Re-export main types for convenience
pub use errors::{FindError, FindResult};
pub use finder::{FilterCriteria, Finder, WalkReport};
