//! 数据访问接口 - 基础设施层
//!
//! 生成流程只通过 `QuestionRepository` 访问数据库。

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{Category, NewCategory, QuestionRecord, UserScore};

/// 题库数据访问
///
/// 每个方法都是一次独立提交的数据库操作，不存在跨调用的事务。
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// 所有分类
    async fn list_categories(&self) -> AppResult<Vec<Category>>;

    /// 某个分类下已有的题目
    async fn list_existing_questions(&self, category_id: i32) -> AppResult<Vec<QuestionRecord>>;

    /// 写入一道题目
    async fn insert_question(&self, record: &QuestionRecord, category_id: i32) -> AppResult<()>;

    /// 记录用户的测验成绩
    async fn record_user_score(
        &self,
        user_id: i64,
        category_id: i32,
        score: i32,
        correct_answers: i32,
    ) -> AppResult<()>;

    /// 用户在所有分类下的成绩，按完成时间倒序
    async fn get_user_scores(&self, user_id: i64) -> AppResult<Vec<UserScore>>;

    async fn get_category_by_slug(&self, slug: &str) -> AppResult<Option<Category>>;

    /// 写入尚不存在的分类，返回新增数量
    async fn seed_categories(&self, categories: &[NewCategory]) -> AppResult<usize>;
}
