//! 题目生成流程 - 流程层
//!
//! 核心职责：定义"一次生成"的完整流程
//!
//! 流程顺序：
//! 1. 已有题目 → 去重提示
//! 2. 调用模型（每次只调用一次）
//! 3. 文本块解析 → 答案随机放置 → 题目记录

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::AppResult;
use crate::models::{Category, QuestionRecord};
use crate::services::answer_randomizer;
use crate::services::block_parser::{BlockParser, CandidateFields, RejectedBlock};
use crate::services::prompt::{format_existing_questions, PromptVariables, QuestionModel};

/// 一次生成的结果
#[derive(Debug, Default)]
pub struct GenerationOutcome {
    /// 通过校验的题目，数量不超过请求数量
    pub questions: Vec<QuestionRecord>,
    /// 被丢弃的题目块
    pub rejected: Vec<RejectedBlock>,
    /// 超出请求数量而被截掉的题目数
    pub surplus: usize,
}

/// 题目来源
///
/// 批量控制器只依赖这个接口，便于替换成脚本化的来源。
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// 请求最多 `count` 道新题目；模型调用失败时返回错误
    async fn generate(
        &self,
        existing: &[QuestionRecord],
        count: usize,
    ) -> AppResult<GenerationOutcome>;
}

/// 题目生成器
///
/// - 绑定一个分类
/// - 不持有数据库
/// - 单个题目块出错只丢弃该块
pub struct QuestionGenerator<'a> {
    model: &'a dyn QuestionModel,
    parser: BlockParser,
    category_name: String,
    category_name_ru: String,
}

impl<'a> QuestionGenerator<'a> {
    pub fn new(model: &'a dyn QuestionModel, category: &Category) -> AppResult<Self> {
        Ok(Self {
            model,
            parser: BlockParser::new()?,
            category_name: category.name.clone(),
            category_name_ru: category.name_ru.clone(),
        })
    }

    fn into_record(candidate: CandidateFields) -> QuestionRecord {
        let placement = answer_randomizer::place(candidate.options);
        QuestionRecord {
            question: candidate.question,
            correct_answer: placement.correct_answer,
            options: placement.options,
            difficulty: candidate.difficulty,
            score: candidate.score,
        }
    }
}

#[async_trait]
impl QuestionSource for QuestionGenerator<'_> {
    async fn generate(
        &self,
        existing: &[QuestionRecord],
        count: usize,
    ) -> AppResult<GenerationOutcome> {
        let existing_text = format_existing_questions(existing);
        let vars = PromptVariables {
            category_name: &self.category_name,
            category_name_ru: &self.category_name_ru,
            existing_questions: &existing_text,
            num_questions: count,
        };

        let response = self.model.invoke(&vars).await?;
        debug!("模型返回 {} 字符", response.chars().count());

        let parsed = self.parser.parse(&response);
        for rejected in &parsed.rejected {
            warn!(
                "⚠️ 丢弃题目块 #{}: {} | {}",
                rejected.index + 1,
                rejected.reason,
                rejected.preview
            );
        }

        let mut questions: Vec<QuestionRecord> =
            parsed.candidates.into_iter().map(Self::into_record).collect();

        let surplus = questions.len().saturating_sub(count);
        if surplus > 0 {
            debug!("模型多返回了 {} 道题目，已截掉", surplus);
            questions.truncate(count);
        }

        Ok(GenerationOutcome {
            questions,
            rejected: parsed.rejected,
            surplus,
        })
    }
}
