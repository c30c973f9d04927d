//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：连接数据库、按需写入分类种子、创建 LLM 服务
//! 2. **加载分类**：全部分类，或由 `CATEGORY_SLUG` 指定的单个分类
//! 3. **逐个处理**：每个分类创建一个生成器，交给 `BatchController`
//! 4. **全局统计**：汇总所有分类的结果
//!
//! 分类之间严格串行，不共享任何可变状态。

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::infrastructure::{PgRepository, QuestionRepository};
use crate::models::{default_categories, load_categories_toml, Category};
use crate::orchestrator::batch_controller::{BatchController, FillReport, RetryPolicy};
use crate::services::{LlmService, QuestionModel};
use crate::utils::logging::{
    log_category_complete, log_category_start, log_startup, print_final_stats,
};
use crate::workflow::QuestionGenerator;

/// 应用主结构
pub struct App {
    config: Config,
    repository: PgRepository,
    llm: LlmService,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let repository = PgRepository::connect(&config)
            .await
            .context("数据库初始化失败")?;

        if config.seed_categories {
            seed_categories(&repository, config.categories_file.as_deref()).await?;
        }

        let llm = LlmService::new(&config);

        Ok(Self {
            config,
            repository,
            llm,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<ProcessingStats> {
        let categories = self.load_categories().await?;

        if categories.is_empty() {
            warn!("⚠️ 数据库中没有分类，程序结束");
            return Ok(ProcessingStats::default());
        }
        info!("✓ 找到 {} 个分类", categories.len());

        let stats = process_categories(
            &self.repository,
            &self.llm,
            &categories,
            &GenerationSettings::from_config(&self.config),
        )
        .await?;

        print_final_stats(&stats);

        Ok(stats)
    }

    /// 加载需要处理的分类
    async fn load_categories(&self) -> Result<Vec<Category>> {
        info!("\n📁 正在加载分类...");
        match &self.config.category_slug {
            Some(slug) => {
                let category = self
                    .repository
                    .get_category_by_slug(slug)
                    .await?
                    .with_context(|| format!("找不到 slug 为 {} 的分类", slug))?;
                Ok(vec![category])
            }
            None => Ok(self.repository.list_categories().await?),
        }
    }
}

/// 写入分类种子
async fn seed_categories(
    repository: &dyn QuestionRepository,
    categories_file: Option<&str>,
) -> Result<usize> {
    let categories = match categories_file {
        Some(path) => load_categories_toml(Path::new(path)).await?,
        None => default_categories(),
    };

    let inserted = repository
        .seed_categories(&categories)
        .await
        .context("写入分类种子失败")?;
    info!("✓ 分类种子写入完成，新增 {} 个", inserted);

    Ok(inserted)
}

/// 每个分类的生成参数
#[derive(Debug, Clone, Copy)]
pub struct GenerationSettings {
    pub questions_per_category: usize,
    pub batch_size: usize,
    pub retry: RetryPolicy,
}

impl GenerationSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            questions_per_category: config.questions_per_category,
            batch_size: config.batch_size,
            retry: RetryPolicy::from_config(config),
        }
    }
}

/// 处理统计
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub questions_added: usize,
    pub reports: Vec<FillReport>,
}

/// 依次为每个分类补充题目
///
/// 单个分类失败（例如触发重试上限）只记入统计，不影响后续分类。
pub async fn process_categories(
    repository: &dyn QuestionRepository,
    model: &dyn QuestionModel,
    categories: &[Category],
    settings: &GenerationSettings,
) -> Result<ProcessingStats> {
    let controller = BatchController::new(repository, settings.retry);
    let mut stats = ProcessingStats {
        total: categories.len(),
        ..Default::default()
    };

    for (idx, category) in categories.iter().enumerate() {
        log_category_start(idx + 1, categories.len(), category);

        let generator = QuestionGenerator::new(model, category)?;
        match controller
            .fill_category(
                &generator,
                category,
                settings.questions_per_category,
                settings.batch_size,
            )
            .await
        {
            Ok(report) => {
                log_category_complete(&report);
                stats.success += 1;
                stats.questions_added += report.accepted;
                stats.reports.push(report);
            }
            Err(e) => {
                error!("{} ❌ 处理失败: {}", category, e);
                stats.failed += 1;
            }
        }
    }

    Ok(stats)
}
