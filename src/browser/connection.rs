use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{AppError, AppResult};

/// 已连接的浏览器与目标页面
pub struct BrowserPage {
    pub browser: Browser,
    pub page: Page,
    /// 页面是否由本程序新建（关闭会话时只关闭自己建的页面）
    pub opened_by_us: bool,
}

/// 连接到已启动（并已登录）的浏览器，并获取目标页面
///
/// 优先复用 URL 以 `target_url` 开头的已有页面，找不到时新建页面并导航。
pub async fn connect_to_browser_and_page(port: u16, target_url: &str) -> AppResult<BrowserPage> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);
    debug!("目标 URL: {}", target_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        AppError::session_failed(format!("连接浏览器 (端口: {})", port), e)
    })?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let pages = browser.pages().await?;
    debug!("获取到 {} 个页面", pages.len());

    for p in pages.iter() {
        if let Ok(Some(url)) = p.url().await {
            debug!("检查页面: {}", url);
            if url.starts_with(target_url) {
                info!("✓ 找到目标页面: {}", url);
                return Ok(BrowserPage {
                    browser,
                    page: p.clone(),
                    opened_by_us: false,
                });
            }
        }
    }
    debug!("未找到匹配的页面，将创建新页面");

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建新页面失败: {}", e);
        AppError::session_failed("创建页面", e)
    })?;
    page.goto(target_url).await.map_err(|e| {
        error!("导航到 {} 失败: {}", target_url, e);
        AppError::session_failed(format!("导航到 {}", target_url), e)
    })?;
    info!("已导航到: {}", target_url);

    Ok(BrowserPage {
        browser,
        page,
        opened_by_us: true,
    })
}
