use directory_harvest::browser::connect_to_browser_and_page;
use directory_harvest::config::Config;
use directory_harvest::logger;
use directory_harvest::{ChromeSessionProvider, Query, SearchOrchestrator, SearchSettings};

#[tokio::test]
#[ignore] // 默认忽略，需要已登录的浏览器：cargo test -- --ignored
async fn test_single_directory_query() {
    // 初始化日志
    logger::init();

    // 加载配置
    let config = Config::from_env();

    let mut query = Query::new();
    query.criterion().last_name().equals("Smith").unwrap();

    let settings = SearchSettings::from_config(&config).expect("配置无效");
    let mut orchestrator = SearchOrchestrator::new(ChromeSessionProvider::new(&config), settings)
        .with_queries([query]);

    let report = orchestrator.run().await.expect("检索失败");

    assert!(report.is_complete(), "查询应该成功");
    assert!(!report.payloads.is_empty(), "应该至少捕获一页结果");
}

#[tokio::test]
#[ignore]
async fn test_browser_connection() {
    // 初始化日志
    logger::init();

    // 加载配置
    let config = Config::from_env();

    // 测试浏览器连接
    let result = connect_to_browser_and_page(config.browser_debug_port, &config.target_url).await;

    assert!(result.is_ok(), "应该能够成功连接浏览器");
}
