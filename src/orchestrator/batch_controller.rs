//! 分批生成控制器 - 编排层
//!
//! ## 职责
//!
//! 为单个分类反复请求题目，直到新增数量达到目标。
//!
//! ## 状态流转
//!
//! ```text
//! LoadingExisting → Generating ⇄ WaitingBackoff → Done
//! ```
//!
//! - 开始时只加载一次已有题目，作为去重依据和提示词上下文
//! - 每批请求 `min(batch_size, 剩余数量)` 道题
//! - 入库成功的题目立即加入已有题目，后续批次的提示词会带上它
//! - 一个批次没有任何题目入库（或调用失败）时按 `RetryPolicy` 等待后重试

use rand::Rng;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{AppResult, GenerationError};
use crate::infrastructure::QuestionRepository;
use crate::models::{Category, QuestionRecord};
use crate::utils::logging::truncate_text;
use crate::workflow::QuestionSource;

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 无产出批次之后的固定等待
    pub delay: Duration,
    /// 在固定等待上追加的随机时长上限
    pub jitter: Duration,
    /// 连续无产出批次的上限，None 表示一直重试
    pub max_failed_batches: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(5),
            jitter: Duration::ZERO,
            max_failed_batches: None,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            delay: config.retry_delay(),
            jitter: config.retry_jitter(),
            max_failed_batches: config.max_failed_batches,
        }
    }

    /// 不等待、不限次数
    pub fn immediate() -> Self {
        Self {
            delay: Duration::ZERO,
            jitter: Duration::ZERO,
            max_failed_batches: None,
        }
    }

    pub fn with_max_failed_batches(mut self, max: u32) -> Self {
        self.max_failed_batches = Some(max);
        self
    }

    /// 本次等待时长
    pub fn backoff_duration(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.delay;
        }
        self.delay + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

/// 控制器状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FillState {
    #[default]
    LoadingExisting,
    Generating,
    WaitingBackoff,
    Done,
}

/// 单个分类的运行状态，分类完成后丢弃
#[derive(Debug)]
struct GenerationBatchState {
    target_count: usize,
    accepted_count: usize,
    existing_questions: Vec<QuestionRecord>,
    /// 已有题干的规范化形式
    seen: HashSet<String>,
}

impl GenerationBatchState {
    fn new(target_count: usize, existing_questions: Vec<QuestionRecord>) -> Self {
        let seen = existing_questions
            .iter()
            .map(|q| normalize_question(&q.question))
            .collect();
        Self {
            target_count,
            accepted_count: 0,
            existing_questions,
            seen,
        }
    }

    fn remaining(&self) -> usize {
        self.target_count.saturating_sub(self.accepted_count)
    }

    fn is_duplicate(&self, record: &QuestionRecord) -> bool {
        self.seen.contains(&normalize_question(&record.question))
    }

    fn accept(&mut self, record: QuestionRecord) {
        self.accepted_count += 1;
        self.seen.insert(normalize_question(&record.question));
        self.existing_questions.push(record);
    }
}

/// 单个分类的处理结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    pub category: String,
    pub target: usize,
    pub accepted: usize,
    /// 调用题目来源的次数
    pub batches: usize,
    pub backoffs: usize,
    pub failed_inserts: usize,
    pub duplicates: usize,
    pub rejected_blocks: usize,
    /// 依次经过的状态
    pub states: Vec<FillState>,
}

impl FillReport {
    fn enter(&mut self, next: FillState) {
        match self.states.last() {
            Some(prev) => debug!("{} 状态: {:?} → {:?}", self.category, prev, next),
            None => debug!("{} 状态: {:?}", self.category, next),
        }
        self.states.push(next);
    }
}

/// 分批生成控制器
pub struct BatchController<'a> {
    repository: &'a dyn QuestionRepository,
    policy: RetryPolicy,
}

impl<'a> BatchController<'a> {
    pub fn new(repository: &'a dyn QuestionRepository, policy: RetryPolicy) -> Self {
        Self { repository, policy }
    }

    /// 为一个分类补充 `target_count` 道新题目
    ///
    /// 只有达到目标或触发重试上限时才会返回。
    pub async fn fill_category(
        &self,
        source: &dyn QuestionSource,
        category: &Category,
        target_count: usize,
        batch_size: usize,
    ) -> AppResult<FillReport> {
        let batch_size = batch_size.max(1);
        let mut report = FillReport {
            category: category.name.clone(),
            target: target_count,
            ..Default::default()
        };

        report.enter(FillState::LoadingExisting);

        let existing = match self.repository.list_existing_questions(category.id).await {
            Ok(existing) => existing,
            Err(e) => {
                warn!("{} ⚠️ 读取已有题目失败，按空列表处理: {}", category, e);
                Vec::new()
            }
        };
        info!("{} 已有 {} 道题目", category, existing.len());

        let mut state = GenerationBatchState::new(target_count, existing);
        let mut failed_batches: u32 = 0;

        while state.accepted_count < state.target_count {
            report.enter(FillState::Generating);

            let current_batch = batch_size.min(state.remaining());
            report.batches += 1;
            info!(
                "{} 📦 生成第 {} 批，共 {} 道 ({}-{})",
                category,
                report.batches,
                current_batch,
                state.accepted_count + 1,
                state.accepted_count + current_batch
            );

            let added = match source.generate(&state.existing_questions, current_batch).await {
                Ok(outcome) => {
                    report.rejected_blocks += outcome.rejected.len();
                    self.persist_batch(category, outcome.questions, &mut state, &mut report)
                        .await
                }
                Err(e) => {
                    error!("{} ❌ 批次生成失败: {}", category, e);
                    debug!("完整错误: {:?}", e);
                    0
                }
            };

            if added > 0 {
                failed_batches = 0;
                continue;
            }

            failed_batches += 1;
            if let Some(max) = self.policy.max_failed_batches {
                if failed_batches >= max {
                    error!(
                        "{} ❌ 连续 {} 个批次没有产出，放弃该分类",
                        category, failed_batches
                    );
                    return Err(GenerationError::RetryLimitExceeded {
                        category: category.name.clone(),
                        failed_batches,
                        accepted: state.accepted_count,
                        target: state.target_count,
                    }
                    .into());
                }
            }

            report.enter(FillState::WaitingBackoff);
            let wait = self.policy.backoff_duration();
            info!(
                "{} ⏳ 本批没有新增题目，{:.1} 秒后重试",
                category,
                wait.as_secs_f32()
            );
            report.backoffs += 1;
            tokio::time::sleep(wait).await;
        }

        report.enter(FillState::Done);
        report.accepted = state.accepted_count;
        info!(
            "{} ✅ 新增 {} 道题目，共 {} 批",
            category, report.accepted, report.batches
        );

        Ok(report)
    }

    /// 逐条写入本批题目，返回成功写入的数量
    async fn persist_batch(
        &self,
        category: &Category,
        questions: Vec<QuestionRecord>,
        state: &mut GenerationBatchState,
        report: &mut FillReport,
    ) -> usize {
        let mut added = 0;

        for record in questions {
            if state.is_duplicate(&record) {
                report.duplicates += 1;
                warn!(
                    "{} ⚠️ 与已有题目重复，跳过: {}",
                    category,
                    truncate_text(&record.question, 60)
                );
                continue;
            }

            match self.repository.insert_question(&record, category.id).await {
                Ok(()) => {
                    added += 1;
                    info!(
                        "{} ✓ 已添加 ({}/{}): {}",
                        category,
                        state.accepted_count + 1,
                        state.target_count,
                        truncate_text(&record.question, 60)
                    );
                    state.accept(record);
                }
                Err(e) => {
                    report.failed_inserts += 1;
                    error!(
                        "{} ✗ 写入失败: {} | {}",
                        category,
                        truncate_text(&record.question, 60),
                        e
                    );
                }
            }
        }

        added
    }
}

/// 题干规范化：小写并合并空白
fn normalize_question(question: &str) -> String {
    question
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
