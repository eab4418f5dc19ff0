//! 查询处理上下文
//!
//! 封装"我正在处理队列中的第几个查询"这一信息

use std::fmt::Display;

/// 查询处理上下文
#[derive(Debug, Clone)]
pub struct QueryCtx {
    /// 查询在队列中的位置（从 0 开始）
    pub index: usize,

    /// 本次运行的查询总数
    pub total: usize,

    /// 查询摘要（仅用于日志显示）
    pub summary: String,
}

impl QueryCtx {
    pub fn new(index: usize, total: usize, summary: String) -> Self {
        Self {
            index,
            total,
            summary,
        }
    }

    /// 日志中显示的序号（从 1 开始）
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

impl Display for QueryCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[查询 {}/{} {}]", self.number(), self.total, self.summary)
    }
}
