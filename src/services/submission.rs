//! 查询提交服务 - 业务能力层
//!
//! 只负责"把一个 WireQuery 填进表单并提交"，不关心分页和结果

use tracing::{debug, info};

use crate::error::AppResult;
use crate::infrastructure::Session;
use crate::models::{ControlKind, WireQuery};
use crate::services::settle::Settle;

/// 提交按钮
pub const SUBMIT_SELECTOR: &str = r#"button[id="submit"]"#;

/// 查询提交服务
pub struct QuerySubmitter {
    settle: Settle,
}

impl QuerySubmitter {
    pub fn new(settle: Settle) -> Self {
        Self { settle }
    }

    /// 填写表单、点击提交并等待网络空闲
    pub async fn submit(
        &self,
        session: &dyn Session,
        wire: &WireQuery,
        query_index: usize,
    ) -> AppResult<()> {
        info!("[查询 {}] 🔍 正在提交查询...", query_index);

        self.settle.wait_for_selector(session, SUBMIT_SELECTOR).await?;

        for field in wire.fields() {
            let selector = field.selector();
            debug!(
                "[查询 {}] 填写 {} = {:?}",
                query_index, field.name, field.value
            );
            match field.kind() {
                ControlKind::Text => {
                    self.settle.wait_for_selector(session, &selector).await?;
                    self.settle
                        .bounded(
                            &format!("输入 {}", field.name),
                            session.fill_text(&selector, field.value),
                        )
                        .await?;
                }
                ControlKind::Choice => {
                    self.settle
                        .bounded(
                            &format!("选择 {}", field.name),
                            session.select_option(&selector, field.value),
                        )
                        .await?;
                }
            }
        }

        self.settle
            .bounded("点击提交", session.click(SUBMIT_SELECTOR))
            .await?;
        self.settle.wait_for_quiescence(session).await?;

        info!("[查询 {}] ✓ 查询已提交", query_index);
        Ok(())
    }
}
