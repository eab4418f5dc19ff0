use crate::error::{AppResult, ConfigError, QueryError};
use crate::models::{Criterion, Field, Operator, Query};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 查询文件结构
///
/// ```toml
/// [[query]]
/// criteria = [
///     { field = "last_name", operator = "equals", term = "Smith" },
///     { field = "dept", operator = "contain", term = "Computer" },
/// ]
/// ```
#[derive(Debug, Deserialize)]
struct QueryFile {
    #[serde(default, rename = "query")]
    queries: Vec<QueryEntry>,
}

#[derive(Debug, Deserialize)]
struct QueryEntry {
    #[serde(default)]
    criteria: Vec<CriterionEntry>,
}

/// 字段与匹配方式既可以写名称，也可以直接写远端 token
#[derive(Debug, Deserialize)]
struct CriterionEntry {
    field: String,
    operator: String,
    #[serde(default)]
    term: String,
}

/// 解析查询文件内容
pub fn parse_queries(content: &str, path: &str) -> AppResult<Vec<Query>> {
    let file: QueryFile = toml::from_str(content).map_err(|e| ConfigError::TomlParseFailed {
        path: path.to_string(),
        source: e,
    })?;

    let mut queries = Vec::with_capacity(file.queries.len());
    for (index, entry) in file.queries.into_iter().enumerate() {
        if entry.criteria.is_empty() {
            return Err(QueryError::EmptyQuery { index }.into());
        }

        let mut criteria = Vec::with_capacity(entry.criteria.len());
        for c in entry.criteria {
            let field = Field::find(&c.field).ok_or_else(|| ConfigError::InvalidQueryFile {
                path: path.to_string(),
                reason: format!("查询 {} 含未知字段: {}", index, c.field),
            })?;
            let operator =
                Operator::find(&c.operator).ok_or_else(|| ConfigError::InvalidQueryFile {
                    path: path.to_string(),
                    reason: format!("查询 {} 含未知匹配方式: {}", index, c.operator),
                })?;
            criteria.push(Criterion::new(field, operator, c.term));
        }

        queries.push(Query::try_from(criteria)?);
    }

    Ok(queries)
}

/// 从 TOML 文件加载查询列表
pub async fn load_queries_from_toml(toml_file_path: &Path) -> AppResult<Vec<Query>> {
    let path = toml_file_path.display().to_string();
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| ConfigError::ReadFailed {
            path: path.clone(),
            source: e,
        })?;

    parse_queries(&content, &path)
}

/// 从文件夹中加载所有 TOML 查询文件
///
/// 单个文件解析失败时记录警告并跳过。
pub async fn load_all_query_files(folder_path: &str) -> AppResult<Vec<Query>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        return Err(ConfigError::DirectoryNotFound {
            path: folder_path.to_string(),
        }
        .into());
    }

    let read_failed = |e| ConfigError::ReadFailed {
        path: folder_path.to_string(),
        source: e,
    };

    let mut toml_files = Vec::new();
    let mut entries = fs::read_dir(&folder).await.map_err(read_failed)?;
    while let Some(entry) = entries.next_entry().await.map_err(read_failed)? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }
    // read_dir 顺序不稳定
    toml_files.sort();

    let mut queries = Vec::new();
    for path in toml_files {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_queries_from_toml(&path).await {
            Ok(loaded) => {
                tracing::info!("成功加载 {} 个查询", loaded.len());
                queries.extend(loaded);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {}", path.display(), e);
            }
        }
    }

    Ok(queries)
}
