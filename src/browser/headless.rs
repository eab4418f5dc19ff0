use std::path::Path;

use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use super::connection::BrowserPage;
use crate::error::{AppError, AppResult};

/// 启动无头浏览器并导航到指定 URL
///
/// 启动的是全新的浏览器，没有登录状态；`chrome_executable` 为空时由 chromiumoxide 自行查找。
pub async fn launch_headless_browser(
    url: &str,
    chrome_executable: Option<&str>,
) -> AppResult<BrowserPage> {
    info!("🚀 启动无头浏览器...");
    debug!("目标 URL: {}", url);

    let mut builder = BrowserConfig::builder().new_headless_mode().args(vec![
        "--disable-gpu",
        "--no-sandbox",
        "--disable-dev-shm-usage",
    ]);
    if let Some(exe) = chrome_executable {
        builder = builder.chrome_executable(Path::new(exe));
    }

    let config = builder.build().map_err(|e| {
        error!("配置无头浏览器失败: {}", e);
        AppError::session_failed(
            "配置无头浏览器",
            std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
        )
    })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动无头浏览器失败: {}", e);
        AppError::session_failed("启动无头浏览器", e)
    })?;
    debug!("无头浏览器启动成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page(url).await.map_err(|e| {
        error!("创建页面失败: {}", e);
        AppError::session_failed("创建页面", e)
    })?;

    info!("✅ 无头浏览器已导航到: {}", url);

    Ok(BrowserPage {
        browser,
        page,
        opened_by_us: true,
    })
}
