//! 分页采集服务 - 业务能力层
//!
//! 提交查询后读取页码指示器，逐页触发"加载第 k 页"。
//! 结果本身由拦截器异步收集，这里只负责翻页。

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::{AppResult, HarvestError};
use crate::infrastructure::Session;
use crate::services::settle::Settle;

/// 页码指示器
pub const PAGE_INDICATOR_SELECTOR: &str = "#pagenums";

/// 分页状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// 没有页码指示器，只有一页
    NoPagination,
    /// 有页码指示器，共 `last_page` 页
    Paginated { last_page: u32 },
}

impl Pagination {
    /// 根据指示器内容判断分页状态
    ///
    /// 取指示器中最后一个整数作为末页；指示器存在却没有整数时返回错误。
    pub fn from_indicator(indicator: Option<&str>) -> Result<Self, HarvestError> {
        let Some(text) = indicator else {
            return Ok(Pagination::NoPagination);
        };

        static DIGITS: OnceLock<Regex> = OnceLock::new();
        let digits = DIGITS.get_or_init(|| Regex::new(r"\d+").expect("valid regex"));

        let last = digits
            .find_iter(text)
            .last()
            .ok_or_else(|| HarvestError::PaginationParse {
                text: text.to_string(),
            })?;
        let last_page = last
            .as_str()
            .parse::<u32>()
            .map_err(|_| HarvestError::PaginationParse {
                text: text.to_string(),
            })?;

        Ok(Pagination::Paginated { last_page })
    }

    /// 总页数
    pub fn total_pages(self) -> u32 {
        match self {
            Pagination::NoPagination => 1,
            Pagination::Paginated { last_page } => last_page.max(1),
        }
    }

    /// 还需要主动加载的页码（第 1 页随提交一起返回）
    pub fn remaining_pages(self) -> std::ops::RangeInclusive<u32> {
        2..=self.total_pages()
    }
}

/// 分页驱动
pub struct PaginationDriver {
    settle: Settle,
}

impl PaginationDriver {
    pub fn new(settle: Settle) -> Self {
        Self { settle }
    }

    /// 读取分页状态并加载剩余所有页，返回总页数
    pub async fn harvest(&self, session: &dyn Session, query_index: usize) -> AppResult<u32> {
        let indicator = self
            .settle
            .bounded(
                "读取页码指示器",
                session.inner_text(PAGE_INDICATOR_SELECTOR),
            )
            .await?;
        debug!("[查询 {}] 页码指示器: {:?}", query_index, indicator);

        let pagination = Pagination::from_indicator(indicator.as_deref())?;
        let total = pagination.total_pages();
        info!("[查询 {}] 📄 共 {} 页", query_index, total);

        for page in pagination.remaining_pages() {
            debug!("[查询 {}] 加载第 {}/{} 页", query_index, page, total);
            self.settle
                .bounded(&format!("加载第 {} 页", page), session.load_page(page))
                .await?;
            self.settle.wait_for_quiescence(session).await?;
            info!("[查询 {}] ✓ 第 {}/{} 页已加载", query_index, page, total);
        }

        Ok(total)
    }
}
