//! 等待策略
//!
//! 所有等待点（元素出现、网络空闲、单步操作）都套上同一个超时上限。

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::infrastructure::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settle {
    /// 网络持续空闲多久视为稳定
    pub quiescence: Duration,
    /// 单步上限
    pub step_timeout: Duration,
}

impl Settle {
    pub fn new(quiescence: Duration, step_timeout: Duration) -> Self {
        Self {
            quiescence,
            step_timeout,
        }
    }

    /// 在超时上限内执行一步
    pub async fn bounded<T>(
        &self,
        step: &str,
        fut: impl Future<Output = AppResult<T>>,
    ) -> AppResult<T> {
        match tokio::time::timeout(self.step_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!("⏱️ {} 超时 ({:?})", step, self.step_timeout);
                Err(AppError::timeout(step, self.step_timeout))
            }
        }
    }

    /// 等待元素出现
    pub async fn wait_for_selector(&self, session: &dyn Session, selector: &str) -> AppResult<()> {
        self.bounded(&format!("等待元素 {}", selector), session.wait_for_selector(selector))
            .await
    }

    /// 等待网络安静下来
    pub async fn wait_for_quiescence(&self, session: &dyn Session) -> AppResult<()> {
        self.bounded("等待网络空闲", session.wait_for_network_idle(self.quiescence))
            .await
    }
}
