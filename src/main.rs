use std::path::Path;

use anyhow::{Context, Result};
use directory_harvest::models::{load_all_query_files, load_queries_from_toml};
use directory_harvest::{logger, ChromeSessionProvider, Config, SearchOrchestrator, SearchSettings};
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logger::init_with_verbose(config.verbose_logging);

    // 加载查询
    let queries_path = Path::new(&config.queries_file);
    let queries = if queries_path.is_dir() {
        load_all_query_files(&config.queries_file).await
    } else {
        load_queries_from_toml(queries_path).await
    }
    .with_context(|| format!("无法加载查询: {}", config.queries_file))?;

    if queries.is_empty() {
        warn!("⚠️ 没有找到待执行的查询，程序结束");
        return Ok(());
    }

    // 执行检索
    let settings = SearchSettings::from_config(&config)?;
    let mut orchestrator = SearchOrchestrator::new(ChromeSessionProvider::new(&config), settings)
        .with_queries(queries);
    let report = orchestrator.run().await?;

    // 结果输出到标准输出
    println!("{}", serde_json::to_string_pretty(&report.payloads)?);

    Ok(())
}
