/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use tracing::info;

use crate::config::Config;
use crate::models::Category;
use crate::orchestrator::{FillReport, ProcessingStats};

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 题目生成模式");
    info!("🤖 模型: {}", config.llm_model_name);
    info!(
        "📊 每个分类 {} 道题目，每批 {} 道",
        config.questions_per_category, config.batch_size
    );
    match config.max_failed_batches {
        Some(max) => info!("🔁 连续 {} 个批次无产出时放弃该分类", max),
        None => info!("🔁 无产出批次不设上限，将一直重试"),
    }
    info!("{}", "=".repeat(60));
}

/// 记录分类开始信息
///
/// # 参数
/// - `index`: 分类序号（从1开始）
/// - `total`: 分类总数
/// - `category`: 当前分类
pub fn log_category_start(index: usize, total: usize, category: &Category) {
    info!("\n{}", "=".repeat(60));
    info!(
        "📂 开始处理第 {}/{} 个分类: {} ({})",
        index, total, category.name, category.name_ru
    );
    info!("{}", "=".repeat(60));
}

/// 记录分类完成信息
pub fn log_category_complete(report: &FillReport) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ {} 完成: 新增 {}/{}，批次 {}，等待 {} 次",
        report.category, report.accepted, report.target, report.batches, report.backoffs
    );
    if report.failed_inserts + report.duplicates + report.rejected_blocks > 0 {
        info!(
            "  写入失败 {}，重复 {}，丢弃题目块 {}",
            report.failed_inserts, report.duplicates, report.rejected_blocks
        );
    }
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(stats: &ProcessingStats) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功分类: {}/{}", stats.success, stats.total);
    info!("❌ 失败分类: {}", stats.failed);
    info!("📝 新增题目: {}", stats.questions_added);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符数）
///
/// # 返回
/// 返回截断后的文本，换行替换为空格
pub fn truncate_text(text: &str, max_len: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() > max_len {
        single_line.chars().take(max_len).collect::<String>() + "..."
    } else {
        single_line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("короткий", 20), "короткий");
        assert_eq!(truncate_text("Многопоточность", 5), "Много...");
        assert_eq!(truncate_text("a\nb", 10), "a b");
    }
}
