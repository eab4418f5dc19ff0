//! 会话能力 - 基础设施层
//!
//! 编排层只通过这两个 trait 操作浏览器：打开会话、操作 DOM、监听网络响应。
//! 登录和会话的建立不在本 crate 的职责范围内。

use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::FutureExt;

use crate::error::AppResult;

/// 会话中观察到的一个网络响应
///
/// 响应体是惰性加载的：只有被拦截器选中的响应才会真正读取内容。
pub struct ObservedResponse {
    pub url: String,
    body: BoxFuture<'static, AppResult<String>>,
}

impl ObservedResponse {
    pub fn new(url: impl Into<String>, body: BoxFuture<'static, AppResult<String>>) -> Self {
        Self {
            url: url.into(),
            body,
        }
    }

    /// 响应体已知的响应
    pub fn ready(url: impl Into<String>, body: impl Into<String>) -> Self {
        let body = body.into();
        Self::new(url, async move { Ok(body) }.boxed())
    }

    /// 读取响应体
    pub async fn body(self) -> AppResult<String> {
        self.body.await
    }
}

impl std::fmt::Debug for ObservedResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservedResponse")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// 网络响应流
pub type ResponseStream = BoxStream<'static, ObservedResponse>;

/// 一个已登录、可导航的浏览器会话
///
/// 所有等待类方法本身不设上限，由调用方套上超时。
#[async_trait]
pub trait Session: Send + Sync {
    /// 订阅网络响应，之后发生的响应都会进入返回的流
    async fn responses(&self) -> AppResult<ResponseStream>;

    /// 等待选择器对应的元素出现
    async fn wait_for_selector(&self, selector: &str) -> AppResult<()>;

    /// 清空文本框后输入
    async fn fill_text(&self, selector: &str, text: &str) -> AppResult<()>;

    /// 下拉框选择指定值
    async fn select_option(&self, selector: &str, value: &str) -> AppResult<()>;

    async fn click(&self, selector: &str) -> AppResult<()>;

    /// 读取元素内容，元素不存在时返回 None
    async fn inner_text(&self, selector: &str) -> AppResult<Option<String>>;

    /// 触发加载第 `page` 页结果
    async fn load_page(&self, page: u32) -> AppResult<()>;

    /// 等待网络空闲：没有进行中的请求，且持续 `quiet` 时长
    async fn wait_for_network_idle(&self, quiet: Duration) -> AppResult<()>;

    /// 释放会话
    async fn close(&self) -> AppResult<()>;
}

/// 会话提供者
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn open(&self) -> AppResult<Box<dyn Session>>;
}
