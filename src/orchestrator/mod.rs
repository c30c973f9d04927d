//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责分类调度和批次控制，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、运行）
//! - 加载分类（全部或按 slug）
//! - 按顺序处理每个分类
//! - 输出全局统计信息
//!
//! ### `batch_controller` - 单个分类的批次控制器
//! - 读取已有题目作为去重提示
//! - 按批次请求生成器，直到达到目标数量
//! - 空批次后等待并重试
//! - 逐条写入数据库，单条失败不影响其他题目
//!
//! ## 层次关系
//!
//! ```text
//! app (处理 Vec<Category>)
//!     ↓
//! batch_controller (处理单个 Category)
//!     ↓
//! workflow::QuestionGenerator (处理单个批次)
//!     ↓
//! services (能力层：prompt / llm / parser / randomizer)
//!     ↓
//! infrastructure (基础设施：QuestionRepository)
//! ```

pub mod app;
pub mod batch_controller;

// 重新导出主要类型
pub use app::{process_categories, App, GenerationSettings, ProcessingStats};
pub use batch_controller::{BatchController, FillReport, FillState, RetryPolicy};
