//! os-find 的命令行接口
//!
//! 本模块提供了命令行参数解析和验证功能。
//! 除了 `--inum` 这类长选项外，也接受 find 风格的单横线写法（`-inum`）。

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

use crate::dispatch::{Dispatch, PathFormat};
use crate::errors::FindError;
use crate::finder::criteria::{FilterCriteria, SizeFilter};

/// find 风格的单横线选项
const FIND_STYLE_OPTIONS: [&str; 5] = ["-inum", "-name", "-size", "-nlinks", "-exec"];

/// 按 inode、名称、大小和硬链接数查找普通文件
#[derive(Parser, Debug)]
#[command(name = "os-find", author, version, about, long_about = None)]
pub struct Cli {
    /// 搜索的根目录
    #[arg(value_name = "DIRECTORY")]
    pub directory: PathBuf,

    /// 按 inode 编号匹配
    #[arg(long, value_name = "NUM")]
    pub inum: Option<u64>,

    /// 按文件名精确匹配
    #[arg(long, value_name = "NAME")]
    pub name: Option<OsString>,

    /// 按大小匹配：-N 不大于，=N 等于，+N 不小于（字节）
    #[arg(long, value_name = "[-=+]BYTES", allow_hyphen_values = true, value_parser = parse_size)]
    pub size: Option<SizeFilter>,

    /// 按硬链接数匹配
    #[arg(long, value_name = "NUM")]
    pub nlinks: Option<u64>,

    /// 用匹配到的路径作为参数执行该命令（替换当前进程）
    #[arg(long, value_name = "COMMAND")]
    pub exec: Option<OsString>,

    /// 启用调试日志
    #[arg(short, long)]
    pub debug: bool,

    /// 输出绝对路径
    #[arg(long)]
    pub absolute: bool,

    /// 输出相对于根目录的路径
    #[arg(long, conflicts_with = "absolute")]
    pub relative: bool,
}

fn parse_size(value: &str) -> Result<SizeFilter, FindError> {
    value.parse()
}

/// 把 find 风格的 `-inum VALUE` 改写为 `--inum=VALUE`
///
/// 合并成一个参数后，以 `-` 开头的值（如 `-size -100`）不会被当作选项。
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut normalized = Vec::new();
    let mut args = args.into_iter().map(Into::into);

    while let Some(arg) = args.next() {
        let is_find_style = arg
            .to_str()
            .map_or(false, |a| FIND_STYLE_OPTIONS.contains(&a));

        if !is_find_style {
            normalized.push(arg);
            continue;
        }

        let mut long = OsString::from("-");
        long.push(&arg);
        if let Some(value) = args.next() {
            long.push("=");
            long.push(value);
        }
        normalized.push(long);
    }

    normalized
}

impl Cli {
    /// 解析进程参数，出错时打印用法并退出
    pub fn parse_args() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    /// 解析给定参数（第一个为程序名）
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize_args(args))
    }

    /// 构建过滤条件
    pub fn build_criteria(&self) -> FilterCriteria {
        let mut criteria = FilterCriteria::new()
            .with_inode(self.inum.unwrap_or(0))
            .with_nlinks(self.nlinks.unwrap_or(0));

        if let Some(name) = &self.name {
            criteria = criteria.with_name(name);
        }
        if let Some(size) = self.size {
            criteria = criteria.with_size(size);
        }

        criteria
    }

    /// 输出路径格式
    pub fn path_format(&self) -> PathFormat {
        if self.absolute {
            PathFormat::Absolute
        } else if self.relative {
            PathFormat::Relative
        } else {
            PathFormat::Joined
        }
    }

    /// 结果的处理方式
    pub fn dispatch(&self) -> Dispatch {
        Dispatch::from_command(self.exec.as_deref())
    }

    /// 验证命令行参数
    pub fn validate(&self) -> Result<(), FindError> {
        if !self.directory.exists() {
            return Err(FindError::InvalidPath(self.directory.clone()));
        }
        if !self.directory.is_dir() {
            return Err(FindError::NotADirectory(self.directory.clone()));
        }
        Ok(())
    }
}
