/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use tracing::{error, info, warn};

use crate::orchestrator::{QueryStatus, RunReport};
use crate::workflow::QueryCtx;

/// 记录运行开始信息
pub fn log_run_start(total: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 目录检索开始");
    info!(
        "开始时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("📋 待执行查询: {} 个", total);
    info!("{}", "=".repeat(60));
}

/// 记录查询开始信息
pub fn log_query_start(ctx: &QueryCtx) {
    info!("\n{}", "─".repeat(60));
    info!("{} 开始", ctx);
}

/// 记录查询完成信息
pub fn log_query_complete(ctx: &QueryCtx, pages: u32, captured: usize) {
    info!(
        "[查询 {}] ✅ 完成: {} 页, 新到达结果 {} 个",
        ctx.number(),
        pages,
        captured
    );
}

/// 打印最终统计信息
pub fn print_final_stats(report: &RunReport) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", report.completed(), report.outcomes.len());
    info!("❌ 失败: {}", report.failed());
    info!(
        "📥 捕获结果: {} (匹配响应 {}, 跳过 {})",
        report.payloads.len(),
        report.intercept.matched,
        report.intercept.skipped
    );

    for outcome in &report.outcomes {
        match &outcome.status {
            QueryStatus::Completed { .. } => {}
            QueryStatus::Failed { stage, error } => {
                error!(
                    "  查询 {} {} 阶段失败: {}",
                    outcome.index + 1,
                    stage,
                    error
                );
            }
            QueryStatus::NotRun => {
                warn!("  查询 {} 未执行", outcome.index + 1);
            }
        }
    }
    if report.aborted {
        warn!("⛔ 运行已按中止策略提前结束");
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
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
    fn test_truncate_text() {
        assert_eq!(truncate_text("短文本", 10), "短文本");
        assert_eq!(truncate_text("abcdefghij", 4), "abcd...");
    }
}
