use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use manga_downloader::state::DEFAULT_STATE_FILE;

/// 漫画章节下载器
#[derive(Parser, Debug)]
#[command(name = "mangadl")]
#[command(version = "1.0")]
#[command(about = "顺序下载漫画章节，支持暂停与断点续传", long_about = None)]
pub struct Cli {
    /// 输出调试日志
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 下载清单中的章节，Ctrl-C 暂停并保存进度
    Download(DownloadArgs),
    /// 查看清单中各章节的下载情况
    Status(LibraryArgs),
    /// 删除一个已下载的章节
    Delete {
        #[command(flatten)]
        library: LibraryArgs,

        /// 要删除的章节ID
        #[arg(long, value_name = "ID")]
        chapter: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct LibraryArgs {
    /// 章节清单 (JSON)
    #[arg(long, value_name = "FILE")]
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub manifest: PathBuf,

    /// 下载目录
    #[arg(long, value_name = "DIR")]
    #[arg(default_value = "./downloads")]
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub output_dir: PathBuf,

    /// 队列状态文件，默认放在下载目录里
    #[arg(long, value_name = "FILE")]
    pub state_file: Option<PathBuf>,
}

impl LibraryArgs {
    pub fn state_file(&self) -> PathBuf {
        self.state_file
            .clone()
            .unwrap_or_else(|| self.output_dir.join(DEFAULT_STATE_FILE))
    }
}

#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub library: LibraryArgs,

    /// 只下载指定系列
    #[arg(long, value_name = "ID")]
    pub series: Option<String>,

    /// 只下载指定章节
    #[arg(long, value_name = "ID")]
    pub chapter: Option<String>,

    /// 单次请求超时（秒），0 表示不限
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// 自定义 User-Agent
    #[arg(long, value_name = "UA")]
    pub user_agent: Option<String>,

    /// 已完整下载的章节也重新下载
    #[arg(long)]
    pub redownload: bool,
}
