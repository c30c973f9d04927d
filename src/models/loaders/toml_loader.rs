use crate::models::category::NewCategory;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;

/// 分类种子文件的结构
///
/// ```toml
/// [[categories]]
/// name = "Generics"
/// name_ru = "Дженерики"
/// slug = "generics"
/// ```
#[derive(Debug, Deserialize)]
struct CategoriesFile {
    #[serde(default)]
    categories: Vec<NewCategory>,
}

/// 从 TOML 文件加载分类种子列表
pub async fn load_categories_toml(toml_file_path: &Path) -> Result<Vec<NewCategory>> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let categories = parse_categories_toml(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    tracing::info!(
        "从 {} 加载了 {} 个分类",
        toml_file_path.display(),
        categories.len()
    );

    Ok(categories)
}

/// 解析分类种子内容，重复的 slug 只保留第一个
pub fn parse_categories_toml(content: &str) -> Result<Vec<NewCategory>> {
    let file: CategoriesFile = toml::from_str(content)?;

    let mut seen = HashSet::new();
    let mut categories = Vec::with_capacity(file.categories.len());
    for category in file.categories {
        if category.slug.trim().is_empty() {
            anyhow::bail!("分类 {} 缺少 slug", category.name);
        }
        if seen.insert(category.slug.clone()) {
            categories.push(category);
        } else {
            tracing::warn!("忽略重复的分类 slug: {}", category.slug);
        }
    }

    Ok(categories)
}
