//! 基于 chromiumoxide 的会话实现

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::cdp::browser_protocol::network::{
    EventResponseReceived, GetResponseBodyParams, RequestId,
};
use chromiumoxide::{Browser, Page};
use futures::{FutureExt, StreamExt};
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::js_executor::JsExecutor;
use super::network_monitor::NetworkMonitor;
use super::session::{ObservedResponse, ResponseStream, Session, SessionProvider};
use crate::browser::{self, BrowserPage};
use crate::config::Config;
use crate::error::{AppError, AppResult};

const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// 读取响应体前等待请求结束的上限
const BODY_WAIT_LIMIT: Duration = Duration::from_secs(10);

/// 打开 Chrome 会话
///
/// 默认连接到调试端口上已登录的浏览器；`headless` 时自行启动浏览器。
pub struct ChromeSessionProvider {
    config: Config,
}

impl ChromeSessionProvider {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

#[async_trait]
impl SessionProvider for ChromeSessionProvider {
    async fn open(&self) -> AppResult<Box<dyn Session>> {
        let browser_page = if self.config.headless {
            browser::launch_headless_browser(
                &self.config.target_url,
                self.config.chrome_executable.as_deref(),
            )
            .await?
        } else {
            browser::connect_to_browser_and_page(
                self.config.browser_debug_port,
                &self.config.target_url,
            )
            .await?
        };

        let session = ChromeSession::new(browser_page, self.config.headless).await?;
        Ok(Box::new(session))
    }
}

/// 元素查询结果
#[derive(Debug, Deserialize)]
struct ElementText {
    found: bool,
    #[serde(default)]
    text: String,
}

/// Chrome 会话
pub struct ChromeSession {
    executor: JsExecutor,
    monitor: NetworkMonitor,
    browser: Mutex<Option<Browser>>,
    close_page: bool,
    close_browser: bool,
}

impl ChromeSession {
    async fn new(browser_page: BrowserPage, launched: bool) -> AppResult<Self> {
        let BrowserPage {
            browser,
            page,
            opened_by_us,
        } = browser_page;

        let monitor = NetworkMonitor::attach(&page).await?;

        Ok(Self {
            executor: JsExecutor::new(page),
            monitor,
            browser: Mutex::new(Some(browser)),
            close_page: opened_by_us,
            close_browser: launched,
        })
    }

    fn page(&self) -> &Page {
        self.executor.page()
    }

    /// 执行返回布尔值的脚本，false 视为元素不存在
    async fn eval_action(&self, action: &str, js_code: String) -> AppResult<()> {
        let ok: bool = self.executor.eval_as(js_code).await?;
        if ok {
            Ok(())
        } else {
            Err(AppError::session_failed(
                action.to_string(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "页面元素或函数不存在"),
            ))
        }
    }
}

async fn fetch_body(
    page: Page,
    monitor: NetworkMonitor,
    request_id: RequestId,
) -> AppResult<String> {
    let id = request_id.inner().clone();
    if !monitor.wait_for_request(&id, BODY_WAIT_LIMIT).await {
        warn!("请求 {} 在 {:?} 内未结束，直接读取响应体", id, BODY_WAIT_LIMIT);
    }

    let response = page.execute(GetResponseBodyParams::new(request_id)).await;
    monitor.forget(&id);
    let response = response?;
    let returns = response.result;

    if returns.base64_encoded {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(returns.body.as_bytes())
            .map_err(|e| AppError::session_failed("解码响应体", e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    } else {
        Ok(returns.body)
    }
}

#[async_trait]
impl Session for ChromeSession {
    async fn responses(&self) -> AppResult<ResponseStream> {
        let page = self.page().clone();
        let monitor = self.monitor.clone();
        let events = self.page().event_listener::<EventResponseReceived>().await?;

        let stream = events.map(move |event| {
            let body = fetch_body(page.clone(), monitor.clone(), event.request_id.clone());
            ObservedResponse::new(event.response.url.clone(), body.boxed())
        });
        Ok(stream.boxed())
    }

    async fn wait_for_selector(&self, selector: &str) -> AppResult<()> {
        debug!("等待元素: {}", selector);
        loop {
            if self.page().find_element(selector).await.is_ok() {
                return Ok(());
            }
            sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn fill_text(&self, selector: &str, text: &str) -> AppResult<()> {
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                if (el === null) return false;
                el.value = '';
                return true;
            }})()
            "#,
            serde_json::to_string(selector)?
        );
        self.eval_action(&format!("清空 {}", selector), js_code)
            .await?;

        let element = self.page().find_element(selector).await?;
        element.click().await?;
        element.type_str(text).await?;
        Ok(())
    }

    async fn select_option(&self, selector: &str, value: &str) -> AppResult<()> {
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                if (el === null) return false;
                el.value = {};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return el.value === {};
            }})()
            "#,
            serde_json::to_string(selector)?,
            serde_json::to_string(value)?,
            serde_json::to_string(value)?
        );
        self.eval_action(&format!("选择 {} = {}", selector, value), js_code)
            .await
    }

    async fn click(&self, selector: &str) -> AppResult<()> {
        self.page().find_element(selector).await?.click().await?;
        Ok(())
    }

    async fn inner_text(&self, selector: &str) -> AppResult<Option<String>> {
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                return el === null ? {{ found: false }} : {{ found: true, text: el.innerHTML }};
            }})()
            "#,
            serde_json::to_string(selector)?
        );
        let result: ElementText = self.executor.eval_as(js_code).await?;
        Ok(result.found.then_some(result.text))
    }

    async fn load_page(&self, page: u32) -> AppResult<()> {
        let js_code = format!(
            r#"
            (() => {{
                if (typeof getDetails !== 'function') return false;
                getDetails({});
                return true;
            }})()
            "#,
            page
        );
        self.eval_action(&format!("加载第 {} 页", page), js_code)
            .await
    }

    async fn wait_for_network_idle(&self, quiet: Duration) -> AppResult<()> {
        self.monitor.wait_for_idle(quiet).await;
        Ok(())
    }

    async fn close(&self) -> AppResult<()> {
        self.monitor.stop();

        if self.close_page {
            if let Err(e) = self.page().clone().close().await {
                warn!("关闭页面失败: {}", e);
            }
        }

        let mut browser = self.browser.lock().await;
        if self.close_browser {
            if let Some(mut b) = browser.take() {
                b.close().await?;
                info!("✓ 浏览器已关闭");
            }
        } else {
            // 连接模式下浏览器由用户管理，只断开连接
            browser.take();
        }
        Ok(())
    }
}
