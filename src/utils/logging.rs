/// 日志工具模块
///
/// 提供日志初始化和格式化输出的辅助函数
use crate::models::BookRequest;
use crate::workflow::state::WorkflowState;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志
///
/// 默认 info 级别，可用 RUST_LOG 覆盖
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 记录程序启动信息
pub fn log_startup(request: &BookRequest) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 教材内容生成模式");
    info!("📚 书名: {}", request.book_name);
    info!("🎓 年级: {}", request.book_grade);
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(state: &WorkflowState, started: chrono::DateTime<chrono::Local>) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部章节生成完成");
    info!("开始时间: {}", started.format("%Y-%m-%d %H:%M:%S"));
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("✅ 已生成章节: {} (大纲共 {} 章)", state.chapters.len(), state.max_chapter_no);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_short_unchanged() {
        assert_eq!(truncate_text("short", 10), "short");
    }

    #[test]
    fn test_truncate_text_long_gets_ellipsis() {
        assert_eq!(truncate_text("abcdefgh", 4), "abcd...");
    }
}
