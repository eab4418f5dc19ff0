//! 查询处理流程 - 流程层
//!
//! 核心职责：定义"一个查询"的完整处理流程
//!
//! 流程顺序：
//! 1. 填写表单并提交 → 等待网络空闲
//! 2. 读取页码 → 逐页加载 → 每页等待网络空闲
//!
//! 结果由拦截器在后台收集，流程本身只报告成功与否。

use tracing::{error, info};

use crate::error::AppError;
use crate::infrastructure::Session;
use crate::models::WireQuery;
use crate::services::{PaginationDriver, QuerySubmitter, Settle};
use crate::workflow::query_ctx::QueryCtx;

/// 失败发生在哪个阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// 填写与提交
    Submit,
    /// 翻页采集
    Paginate,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Submit => write!(f, "提交"),
            Stage::Paginate => write!(f, "翻页"),
        }
    }
}

/// 查询处理结果
#[derive(Debug)]
pub enum ProcessResult {
    /// 处理完成
    Completed { pages: u32 },
    /// 处理失败
    Failed { stage: Stage, error: AppError },
}

/// 查询处理流程
///
/// - 编排单个查询的 提交 → 翻页
/// - 不持有会话资源
/// - 不接触结果累加器
pub struct QueryFlow {
    submitter: QuerySubmitter,
    pagination: PaginationDriver,
}

impl QueryFlow {
    pub fn new(settle: Settle) -> Self {
        Self {
            submitter: QuerySubmitter::new(settle),
            pagination: PaginationDriver::new(settle),
        }
    }

    pub async fn run(
        &self,
        session: &dyn Session,
        wire: &WireQuery,
        ctx: &QueryCtx,
    ) -> ProcessResult {
        info!("{} 开始处理", ctx);

        // ========== 流程 1: 提交 ==========
        if let Err(e) = self.submitter.submit(session, wire, ctx.number()).await {
            error!("[查询 {}] ❌ 提交失败: {}", ctx.number(), e);
            return ProcessResult::Failed {
                stage: Stage::Submit,
                error: e,
            };
        }

        // ========== 流程 2: 翻页 ==========
        match self.pagination.harvest(session, ctx.number()).await {
            Ok(pages) => ProcessResult::Completed { pages },
            Err(e) => {
                error!("[查询 {}] ❌ 翻页失败: {}", ctx.number(), e);
                ProcessResult::Failed {
                    stage: Stage::Paginate,
                    error: e,
                }
            }
        }
    }
}
