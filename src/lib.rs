//! # Quiz Question Gen
//!
//! 为测验题库按分类批量生成选择题的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有数据库连接池，只暴露能力
//! - `QuestionRepository` - 分类、题目、成绩的读写接口
//! - `PgRepository` - 基于 sqlx 的 PostgreSQL 实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `LlmService` - 调用 OpenAI 兼容接口生成题目文本
//! - `BlockParser` - 把模型输出切分并校验为题目字段
//! - `answer_randomizer` - 把正确答案随机放到四个位置之一
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个批次"的完整生成流程
//! - `QuestionGenerator` - 去重提示 → 模型 → 解析 → 随机放置
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 应用入口，依次处理每个分类
//! - `orchestrator/batch_controller` - 单个分类的批次与重试控制
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{PgRepository, QuestionRepository};
pub use models::{Category, Difficulty, QuestionRecord};
pub use orchestrator::{process_categories, App, BatchController, RetryPolicy};
pub use workflow::{QuestionGenerator, QuestionSource};
