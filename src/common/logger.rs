use colored::*;
use tracing_subscriber::EnvFilter;

/// 初始化日志，`RUST_LOG` 优先于命令行的 verbose 开关
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("manga_downloader={default_level},mangadl={default_level},warn")));

    // 测试里可能重复初始化，忽略错误
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 面向用户的终端输出，日志细节走 tracing
pub struct PrettyLogger;

impl PrettyLogger {
    fn line(mark: ColoredString, message: &str) {
        println!("{mark} {message}");
    }

    pub fn success(message: impl AsRef<str>) {
        Self::line("✓".green().bold(), message.as_ref());
    }

    pub fn info(message: impl AsRef<str>) {
        Self::line("ℹ".blue().bold(), message.as_ref());
    }

    pub fn warning(message: impl AsRef<str>) {
        Self::line("⚠".yellow().bold(), message.as_ref());
    }

    // 错误写到 stderr，方便脚本区分
    pub fn error(message: impl AsRef<str>) {
        eprintln!("{} {}", "✗".red().bold(), message.as_ref());
    }

    /// 单个章节的本地状态：● 已完成 / ◐ 部分 / ○ 未下载
    pub fn chapter_status(series: impl AsRef<str>, chapter: impl AsRef<str>, pages: usize, total: usize) {
        let mark = if total > 0 && pages >= total {
            "●".green().bold()
        } else if pages > 0 {
            "◐".yellow().bold()
        } else {
            "○".bright_black()
        };
        let counter = format!("[{pages}/{total}]").cyan();
        Self::line(mark, &format!("{} / {} {counter}", series.as_ref().bold(), chapter.as_ref()));
    }

    pub fn separator() {
        println!("{}", "┄".repeat(48).bright_black());
    }

    pub fn completion_summary(lines: &[String]) {
        println!();
        Self::line("📚".normal(), &"全部章节下载完成".green().bold().to_string());
        for line in lines {
            println!("   {line}");
        }
    }
}

#[macro_export]
macro_rules! log_success {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::success(::std::format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::info(::std::format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::warning(::std::format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::error(::std::format!($($arg)*))
    };
}
