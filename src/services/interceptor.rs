//! 响应拦截服务 - 业务能力层
//!
//! 只负责"过滤 + 解码 + 追加"，不关心是哪个查询、哪一页产生的响应

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::{FutureExt, StreamExt};
use regex::Regex;
use serde_json::Value as JsonValue;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::error::HarvestError;
use crate::infrastructure::{ObservedResponse, ResponseStream};
use crate::services::payload_decoder::decode_compact;

/// 结果累加器：按到达顺序追加，只增不删
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    inner: Arc<Mutex<Vec<JsonValue>>>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, payload: JsonValue) {
        match self.inner.lock() {
            Ok(mut items) => items.push(payload),
            Err(poisoned) => poisoned.into_inner().push(payload),
        }
    }

    pub fn len(&self) -> usize {
        match self.inner.lock() {
            Ok(items) => items.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 取出当前全部内容
    pub fn snapshot(&self) -> Vec<JsonValue> {
        match self.inner.lock() {
            Ok(items) => items.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// 拦截器统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterceptStats {
    /// URL 匹配的响应数
    pub matched: usize,
    /// 成功解码并追加的数量
    pub captured: usize,
    /// 读取或解码失败被跳过的数量
    pub skipped: usize,
}

#[derive(Debug, Default)]
struct Counters {
    matched: AtomicUsize,
    captured: AtomicUsize,
    skipped: AtomicUsize,
}

impl Counters {
    fn snapshot(&self) -> InterceptStats {
        InterceptStats {
            matched: self.matched.load(Ordering::Relaxed),
            captured: self.captured.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

/// 响应拦截器
///
/// 职责：
/// - 按 URL 规则过滤响应
/// - 解码 XML 响应并追加到累加器
/// - 单个响应失败只记录并跳过，不影响整个运行
pub struct ResponseInterceptor {
    pattern: Regex,
    accumulator: Accumulator,
    counters: Arc<Counters>,
}

/// 已注册的拦截器，持有后台任务
pub struct InterceptorHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
    counters: Arc<Counters>,
}

impl ResponseInterceptor {
    pub fn new(pattern: Regex, accumulator: Accumulator) -> Self {
        Self {
            pattern,
            accumulator,
            counters: Arc::new(Counters::default()),
        }
    }

    /// URL 是否属于目录服务的结果响应
    pub fn matches(&self, url: &str) -> bool {
        self.pattern.is_match(url)
    }

    /// 处理单个响应，返回是否追加了结果
    pub async fn handle(&self, response: ObservedResponse) -> bool {
        if !self.matches(&response.url) {
            return false;
        }
        self.counters.matched.fetch_add(1, Ordering::Relaxed);

        let url = response.url.clone();
        let decoded = match response.body().await {
            Ok(body) => decode_compact(&body).map_err(|reason| HarvestError::PayloadDecode {
                url: url.clone(),
                reason,
            }),
            Err(e) => Err(HarvestError::PayloadDecode {
                url: url.clone(),
                reason: e.to_string(),
            }),
        };

        match decoded {
            Ok(tree) => {
                self.accumulator.push(tree);
                self.counters.captured.fetch_add(1, Ordering::Relaxed);
                debug!("📥 已捕获响应: {}", url);
                true
            }
            Err(e) => {
                self.counters.skipped.fetch_add(1, Ordering::Relaxed);
                warn!("⚠️ 跳过响应: {}", e);
                false
            }
        }
    }

    /// 在响应流上注册，返回后台任务句柄
    pub fn register(self, mut responses: ResponseStream) -> InterceptorHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let counters = Arc::clone(&self.counters);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    next = responses.next() => match next {
                        Some(response) => {
                            self.handle(response).await;
                        }
                        None => {
                            debug!("响应流已结束");
                            return;
                        }
                    },
                    _ = &mut shutdown_rx => break,
                }
            }

            // 停止前处理已经到达的响应
            while let Some(Some(response)) = responses.next().now_or_never() {
                self.handle(response).await;
            }
        });

        InterceptorHandle {
            shutdown: Some(shutdown_tx),
            task,
            counters,
        }
    }
}

impl InterceptorHandle {
    pub fn stats(&self) -> InterceptStats {
        self.counters.snapshot()
    }

    /// 停止拦截，等待已到达的响应处理完毕
    pub async fn stop(mut self) -> InterceptStats {
        if let Some(shutdown) = self.shutdown.take() {
            // 任务可能已因流结束而退出
            let _ = shutdown.send(());
        }
        if let Err(e) = (&mut self.task).await {
            error!("响应拦截任务异常退出: {}", e);
        }
        self.counters.snapshot()
    }
}

impl Drop for InterceptorHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use serde_json::json;

    fn interceptor() -> (ResponseInterceptor, Accumulator) {
        let accumulator = Accumulator::new();
        let pattern = Regex::new("MSUDirectory1612_WAR_directory1612").unwrap();
        (
            ResponseInterceptor::new(pattern, accumulator.clone()),
            accumulator,
        )
    }

    const MATCHING_URL: &str =
        "https://my.msstate.edu/web/home?p_p_id=MSUDirectory1612_WAR_directory1612&p_p_lifecycle=2";

    #[tokio::test]
    async fn test_matching_response_is_decoded_and_appended() {
        let (interceptor, accumulator) = interceptor();
        let appended = interceptor
            .handle(ObservedResponse::ready(MATCHING_URL, "<r><x>1</x></r>"))
            .await;

        assert!(appended);
        assert_eq!(accumulator.snapshot(), vec![json!({ "r": { "x": { "_text": "1" } } })]);
    }

    #[tokio::test]
    async fn test_non_matching_response_never_appends() {
        let (interceptor, accumulator) = interceptor();
        let appended = interceptor
            .handle(ObservedResponse::ready(
                "https://my.msstate.edu/static/app.js",
                "<r><x>1</x></r>",
            ))
            .await;

        assert!(!appended);
        assert!(accumulator.is_empty());
        assert_eq!(interceptor.counters.snapshot().matched, 0);
    }

    #[tokio::test]
    async fn test_decode_failure_is_skipped() {
        let (interceptor, accumulator) = interceptor();
        assert!(!interceptor
            .handle(ObservedResponse::ready(MATCHING_URL, "<r><x>"))
            .await);
        assert!(interceptor
            .handle(ObservedResponse::ready(MATCHING_URL, "<r/>"))
            .await);

        assert_eq!(accumulator.len(), 1);
        assert_eq!(
            interceptor.counters.snapshot(),
            InterceptStats {
                matched: 2,
                captured: 1,
                skipped: 1
            }
        );
    }

    #[tokio::test]
    async fn test_registered_interceptor_drains_stream() {
        let (interceptor, accumulator) = interceptor();
        let responses = stream::iter(vec![
            ObservedResponse::ready(MATCHING_URL, "<r><x>1</x></r>"),
            ObservedResponse::ready("https://elsewhere.example/", "<r/>"),
            ObservedResponse::ready(MATCHING_URL, "<r><x>2</x></r>"),
        ])
        .boxed();

        let handle = interceptor.register(responses);
        let stats = handle.stop().await;

        assert_eq!(stats.captured, 2);
        assert_eq!(accumulator.len(), 2);
        assert_eq!(accumulator.snapshot()[1]["r"]["x"]["_text"], "2");
    }
}
