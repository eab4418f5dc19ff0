use std::time::Duration;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 查询模型错误（调用方用法错误）
    #[error("查询错误: {0}")]
    Query(#[from] QueryError),
    /// 采集过程错误
    #[error("采集错误: {0}")]
    Harvest(#[from] HarvestError),
    /// 浏览器会话错误
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 查询模型错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// 查询中没有任何条件
    #[error("查询 {index} 至少需要一个条件")]
    EmptyQuery { index: usize },
    /// 条件数量超出上限，条件未被添加
    #[error("条件数量超出上限 {limit}，条件未被添加")]
    CriterionLimitExceeded { limit: usize },
}

/// 采集过程错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarvestError {
    /// 页码指示器存在但无法解析出整数
    #[error("无法解析页码指示器: {text:?}")]
    PaginationParse { text: String },
    /// 响应内容解码失败
    #[error("响应解码失败 ({url}): {reason}")]
    PayloadDecode { url: String, reason: String },
}

/// 浏览器会话错误
#[derive(Debug, Error)]
pub enum SessionError {
    /// 会话操作失败
    #[error("{action} 失败: {source}")]
    Failure {
        action: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 等待超时
    #[error("{step} 超时 ({after:?})")]
    Timeout { step: String, after: Duration },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
    /// 响应 URL 规则不是合法正则
    #[error("URL 规则无效 ({pattern}): {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    /// 查询文件内容无效
    #[error("查询文件无效 ({path}): {reason}")]
    InvalidQueryFile { path: String, reason: String },
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::session_failed("浏览器操作", err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::session_failed("JSON 转换", err)
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建会话操作失败错误
    pub fn session_failed(
        action: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Session(SessionError::Failure {
            action: action.into(),
            source: Box::new(source),
        })
    }

    /// 创建超时错误
    pub fn timeout(step: impl Into<String>, after: Duration) -> Self {
        AppError::Session(SessionError::Timeout {
            step: step.into(),
            after,
        })
    }

    /// 是否为超时错误
    pub fn is_timeout(&self) -> bool {
        matches!(self, AppError::Session(SessionError::Timeout { .. }))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
