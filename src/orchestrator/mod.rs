//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责查询队列的执行和资源调度，是整个系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::SearchOrchestrator (处理 Vec<Query>，持有会话和累加器)
//!     ↓
//! workflow::QueryFlow (处理单个 Query：提交 → 翻页)
//!     ↓
//! services (能力层：submission / pagination / interceptor)
//!     ↓
//! infrastructure (基础设施：Session / ChromeSession)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源隔离**：只有编排层持有会话
//! 2. **向下依赖**：编排层 → workflow → services → infrastructure
//! 3. **无业务逻辑**：只做调度和统计

pub mod search_orchestrator;

pub use search_orchestrator::{
    QueryOutcome, QueryStatus, RunReport, SearchOrchestrator, SearchSettings,
};
