//! # Directory Harvest
//!
//! 通过自动化浏览器会话查询表单驱动的目录服务，并收集分页、异步返回的结果
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（会话），只暴露能力
//! - `Session` / `SessionProvider` - 会话能力接口
//! - `ChromeSession` - 基于 chromiumoxide 的实现，`JsExecutor` 负责执行 JS
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `QuerySubmitter` - 填写并提交表单
//! - `PaginationDriver` - 读取页码并逐页加载
//! - `ResponseInterceptor` - 过滤、解码、累加网络响应
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个查询"的完整处理流程
//! - `QueryFlow` - 提交 → 翻页
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/` - 查询队列、会话生命周期、结果汇总
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, QueryErrorPolicy};
pub use error::{AppError, AppResult};
pub use infrastructure::{ChromeSessionProvider, Session, SessionProvider};
pub use models::{Criterion, Field, Operator, Query, WireQuery};
pub use orchestrator::{QueryOutcome, QueryStatus, RunReport, SearchOrchestrator, SearchSettings};
