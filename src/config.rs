use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppResult, ConfigError};

/// 单个查询失败后的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryErrorPolicy {
    /// 记录失败，继续下一个查询
    #[default]
    Skip,
    /// 停止处理剩余查询
    Abort,
}

impl FromStr for QueryErrorPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(QueryErrorPolicy::Skip),
            "abort" => Ok(QueryErrorPolicy::Abort),
            _ => Err(ConfigError::EnvVarParseFailed {
                var_name: "ON_QUERY_ERROR".to_string(),
                value: s.to_string(),
                expected_type: "skip | abort".to_string(),
            }),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 浏览器调试端口（连接已登录的浏览器）
    pub browser_debug_port: u16,
    /// 目录服务所在页面
    pub target_url: String,
    /// 是否自行启动无头浏览器
    pub headless: bool,
    /// 浏览器可执行文件路径
    pub chrome_executable: Option<String>,
    /// 检索界面就绪标志
    pub ready_selector: String,
    /// 结果响应 URL 规则（正则）
    pub response_url_pattern: String,
    /// 网络空闲窗口（毫秒）
    pub quiescence_ms: u64,
    /// 单步等待上限（毫秒）
    pub step_timeout_ms: u64,
    /// 查询失败后的策略
    pub on_query_error: QueryErrorPolicy,
    /// 查询文件或存放查询文件的目录
    pub queries_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            target_url: "https://my.msstate.edu/".to_string(),
            headless: false,
            chrome_executable: None,
            ready_selector: "#portlet_MSUDirectory1612_WAR_directory1612".to_string(),
            response_url_pattern: "MSUDirectory1612_WAR_directory1612".to_string(),
            quiescence_ms: 500,
            step_timeout_ms: 30_000,
            on_query_error: QueryErrorPolicy::Skip,
            queries_file: "queries.toml".to_string(),
            verbose_logging: false,
        }
    }
}

fn env_or<T: FromStr>(var_name: &str, default: T) -> T {
    std::env::var(var_name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量读取配置，缺失或无法解析的项使用默认值
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 启动时加载配置
    ///
    /// 设置了 `CONFIG_FILE` 时以该 TOML 文件为基础，环境变量仍然优先。
    pub fn load() -> AppResult<Self> {
        let base = match std::env::var("CONFIG_FILE") {
            Ok(path) => Self::from_toml_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    /// 用环境变量覆盖已有配置，缺失或无法解析的项保持原值
    pub fn with_env_overrides(self) -> Self {
        Self {
            browser_debug_port: env_or("BROWSER_DEBUG_PORT", self.browser_debug_port),
            target_url: std::env::var("TARGET_URL").unwrap_or(self.target_url),
            headless: env_or("HEADLESS", self.headless),
            chrome_executable: std::env::var("CHROME_EXECUTABLE")
                .ok()
                .or(self.chrome_executable),
            ready_selector: std::env::var("READY_SELECTOR").unwrap_or(self.ready_selector),
            response_url_pattern: std::env::var("RESPONSE_URL_PATTERN")
                .unwrap_or(self.response_url_pattern),
            quiescence_ms: env_or("QUIESCENCE_MS", self.quiescence_ms),
            step_timeout_ms: env_or("STEP_TIMEOUT_MS", self.step_timeout_ms),
            on_query_error: env_or("ON_QUERY_ERROR", self.on_query_error),
            queries_file: std::env::var("QUERIES_FILE").unwrap_or(self.queries_file),
            verbose_logging: env_or("VERBOSE_LOGGING", self.verbose_logging),
        }
    }

    /// 从 TOML 文件读取配置，未写的项使用默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: display.clone(),
            source: e,
        })?;
        let config = toml::from_str(&content).map_err(|e| ConfigError::TomlParseFailed {
            path: display,
            source: e,
        })?;
        Ok(config)
    }

    pub fn quiescence(&self) -> Duration {
        Duration::from_millis(self.quiescence_ms)
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_millis(self.step_timeout_ms)
    }
}
