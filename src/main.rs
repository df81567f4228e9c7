use anyhow::{Context, Result};
use log::{debug, info, warn};

use os_find::cli::Cli;
use os_find::dispatch;
use os_find::finder::Finder;

fn main() -> Result<()> {
    // 解析命令行参数
    let cli = Cli::parse_args();

    // 初始化日志
    env_logger::Builder::new()
        .filter_level(if cli.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    info!("开始运行 os-find");
    cli.validate().with_context(|| "参数验证失败")?;

    let finder = Finder::new(cli.build_criteria());
    debug!("在路径中搜索: {}", cli.directory.display());

    // 执行搜索
    let report = finder
        .find(&cli.directory)
        .with_context(|| format!("无法读取目录 {}", cli.directory.display()))?;

    let skipped = report.errors.iter().filter(|err| err.is_traversal()).count();
    if skipped > 0 {
        warn!("{} 个路径因读取错误被跳过", skipped);
    }

    let paths = dispatch::format_paths(&cli.directory, &report.matches, cli.path_format())?;

    // 打印结果或执行外部命令
    cli.dispatch().run(&paths)?;

    Ok(())
}
