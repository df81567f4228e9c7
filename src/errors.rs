use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for operations that can produce FindError
pub type FindResult<T> = Result<T, FindError>;

/// os-find 的自定义错误类型
#[derive(Debug, Error)]
pub enum FindError {
    /// 目录内容读取失败（getdents64 出错）
    #[error("Error reading contents of {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 子目录无法打开
    #[error("Error opening directory {}: {source}", .path.display())]
    OpenDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 过滤时文件无法打开
    #[error("Error opening file at {}: {source}", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 过滤时读取文件状态失败
    #[error("Error reading stats of file at {}: {source}", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 指定的路径不存在
    #[error("Invalid path: {}", .0.display())]
    InvalidPath(PathBuf),

    /// 指定的路径不是目录
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// -size 参数格式错误
    #[error("Bad -size argument: '{0}'")]
    InvalidSize(String),

    /// 外部命令执行失败
    #[error("Error executing {command}: {source}")]
    Exec {
        command: String,
        #[source]
        source: io::Error,
    },

    /// 结果输出失败
    #[error("Error writing results: {0}")]
    Output(#[from] io::Error),
}

impl FindError {
    /// 遍历或过滤过程中产生的非致命错误
    pub fn is_traversal(&self) -> bool {
        matches!(
            self,
            FindError::ReadDir { .. }
                | FindError::OpenDir { .. }
                | FindError::OpenFile { .. }
                | FindError::Stat { .. }
        )
    }
}
