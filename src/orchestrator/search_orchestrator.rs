//! 检索编排器 - 编排层
//!
//! ## 职责
//!
//! 1. **查询队列**：收集待执行的查询，运行前统一转换为提交格式（空查询直接报错，不打开会话）
//! 2. **会话管理**：一次运行只打开一个会话，结束后释放
//! 3. **拦截注册**：在任何提交之前注册响应拦截器
//! 4. **顺序执行**：查询逐个执行，单个查询失败按策略跳过或中止
//! 5. **结果汇总**：返回累加器内容和每个查询的处理结果
//!
//! `run` 需要 `&mut self`，同一个编排器不可能被并发运行。

use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::{error, warn};

use crate::config::{Config, QueryErrorPolicy};
use crate::error::{AppError, AppResult, ConfigError};
use crate::infrastructure::{Session, SessionProvider};
use crate::models::{Query, WireQuery};
use crate::services::{Accumulator, InterceptStats, ResponseInterceptor, Settle};
use crate::utils::logging;
use crate::workflow::{ProcessResult, QueryCtx, QueryFlow, Stage};

/// 检索参数
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// 检索界面就绪标志
    pub ready_selector: String,
    /// 结果响应 URL 规则
    pub response_pattern: Regex,
    pub settle: Settle,
    pub on_query_error: QueryErrorPolicy,
}

impl SearchSettings {
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let response_pattern = Regex::new(&config.response_url_pattern).map_err(|e| {
            ConfigError::InvalidPattern {
                pattern: config.response_url_pattern.clone(),
                source: e,
            }
        })?;

        Ok(Self {
            ready_selector: config.ready_selector.clone(),
            response_pattern,
            settle: Settle::new(config.quiescence(), config.step_timeout()),
            on_query_error: config.on_query_error,
        })
    }
}

/// 单个查询的处理状态
#[derive(Debug)]
pub enum QueryStatus {
    /// 已完成
    Completed {
        pages: u32,
        /// 处理期间新到达的结果数（按到达时间统计，不保证归属）
        captured: usize,
    },
    /// 失败
    Failed { stage: Stage, error: AppError },
    /// 因中止策略未执行
    NotRun,
}

/// 单个查询的处理结果
#[derive(Debug)]
pub struct QueryOutcome {
    /// 查询在队列中的位置（从 0 开始）
    pub index: usize,
    pub query: Query,
    pub status: QueryStatus,
}

impl QueryOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self.status, QueryStatus::Completed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, QueryStatus::Failed { .. })
    }
}

/// 一次运行的汇总
#[derive(Debug)]
pub struct RunReport {
    /// 解码后的结果，按到达顺序
    pub payloads: Vec<JsonValue>,
    pub outcomes: Vec<QueryOutcome>,
    pub intercept: InterceptStats,
    /// 是否因中止策略提前结束
    pub aborted: bool,
}

impl RunReport {
    pub fn completed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_completed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    /// 所有查询都已完成
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(QueryOutcome::is_completed)
    }
}

/// 检索编排器
pub struct SearchOrchestrator<P: SessionProvider> {
    provider: P,
    settings: SearchSettings,
    queue: Vec<Query>,
}

impl<P: SessionProvider> SearchOrchestrator<P> {
    pub fn new(provider: P, settings: SearchSettings) -> Self {
        Self {
            provider,
            settings,
            queue: Vec::new(),
        }
    }

    /// 加入一个查询
    pub fn add_query(&mut self, query: Query) -> &mut Self {
        self.queue.push(query);
        self
    }

    pub fn with_queries(mut self, queries: impl IntoIterator<Item = Query>) -> Self {
        self.queue.extend(queries);
        self
    }

    /// 待执行的查询
    pub fn pending(&self) -> &[Query] {
        &self.queue
    }

    /// 执行队列中的全部查询
    ///
    /// 空查询在打开会话前就会返回 `EmptyQuery`，此时队列保持不变。
    /// 会话打开、拦截器注册、等待就绪失败时返回错误；
    /// 进入查询循环后，单个查询的失败记录在 `RunReport::outcomes` 中。
    pub async fn run(&mut self) -> AppResult<RunReport> {
        let wires = self
            .queue
            .iter()
            .enumerate()
            .map(|(index, query)| query.to_wire_at(index))
            .collect::<Result<Vec<WireQuery>, _>>()?;
        let queries = std::mem::take(&mut self.queue);

        logging::log_run_start(queries.len());

        let session = self.provider.open().await?;
        let result = self.run_with_session(session.as_ref(), queries, wires).await;

        if let Err(e) = session.close().await {
            warn!("⚠️ 释放会话失败: {}", e);
        }

        if let Ok(report) = &result {
            logging::print_final_stats(report);
        }
        result
    }

    async fn run_with_session(
        &self,
        session: &dyn Session,
        queries: Vec<Query>,
        wires: Vec<WireQuery>,
    ) -> AppResult<RunReport> {
        let settle = self.settings.settle;
        let accumulator = Accumulator::new();

        // 先注册拦截器，避免丢失第一次提交的响应
        let responses = session.responses().await?;
        let interceptor =
            ResponseInterceptor::new(self.settings.response_pattern.clone(), accumulator.clone())
                .register(responses);

        if let Err(e) = settle
            .wait_for_selector(session, &self.settings.ready_selector)
            .await
        {
            error!("❌ 检索界面未就绪: {}", e);
            interceptor.stop().await;
            return Err(e);
        }

        let flow = QueryFlow::new(settle);
        let total = queries.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut aborted = false;

        for (index, (query, wire)) in queries.into_iter().zip(wires.iter()).enumerate() {
            if aborted {
                outcomes.push(QueryOutcome {
                    index,
                    query,
                    status: QueryStatus::NotRun,
                });
                continue;
            }

            let ctx = QueryCtx::new(index, total, logging::truncate_text(&query.to_string(), 80));
            logging::log_query_start(&ctx);

            let before = accumulator.len();
            let status = match flow.run(session, wire, &ctx).await {
                ProcessResult::Completed { pages } => {
                    let captured = accumulator.len().saturating_sub(before);
                    logging::log_query_complete(&ctx, pages, captured);
                    QueryStatus::Completed { pages, captured }
                }
                ProcessResult::Failed { stage, error } => {
                    if self.settings.on_query_error == QueryErrorPolicy::Abort {
                        warn!("{} ⛔ 按中止策略停止剩余查询", ctx);
                        aborted = true;
                    }
                    QueryStatus::Failed { stage, error }
                }
            };

            outcomes.push(QueryOutcome {
                index,
                query,
                status,
            });
        }

        let intercept = interceptor.stop().await;

        Ok(RunReport {
            payloads: accumulator.snapshot(),
            outcomes,
            intercept,
            aborted,
        })
    }
}
