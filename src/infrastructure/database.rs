//! PostgreSQL 题库 - 基础设施层
//!
//! 持有唯一的连接池，只暴露 `QuestionRepository` 能力
//!
//! 表结构（由外部迁移维护）：
//! - `categories(id, name, name_ru, slug)`
//! - `quiz_questions(category_id, question, correct_answer, options jsonb, difficulty, score)`
//! - `user_scores(user_id, category_id, score, correct_answers, completed_at timestamptz)`

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, DatabaseError};
use crate::infrastructure::repository::QuestionRepository;
use crate::models::{Category, Difficulty, NewCategory, QuestionRecord, UserScore, DEFAULT_SCORE};

/// 题目表中的一行
#[derive(Debug, sqlx::FromRow)]
struct QuestionRow {
    question: String,
    correct_answer: String,
    options: Json<Vec<String>>,
    difficulty: Option<String>,
    score: Option<i32>,
}

impl QuestionRow {
    /// 选项数量不是 4 的历史数据无法作为题目记录使用
    fn into_record(self) -> Option<QuestionRecord> {
        let options: [String; 4] = self.options.0.try_into().ok()?;
        Some(QuestionRecord {
            question: self.question,
            correct_answer: self.correct_answer,
            options,
            difficulty: self
                .difficulty
                .map(|d| Difficulty::parse(&d))
                .unwrap_or(Difficulty::Medium),
            score: self
                .score
                .and_then(|s| u32::try_from(s).ok())
                .filter(|&s| s > 0)
                .unwrap_or(DEFAULT_SCORE),
        })
    }
}

/// PostgreSQL 实现
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    /// 按配置建立连接池
    pub async fn connect(config: &Config) -> AppResult<Self> {
        info!(
            "🔌 正在连接数据库 (连接池上限: {})",
            config.db_max_connections
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
            .max_lifetime(Duration::from_secs(config.db_max_lifetime_secs))
            .connect(&config.database_url)
            .await
            .map_err(|source| DatabaseError::ConnectionFailed { source })?;

        info!("✓ 数据库连接成功");

        Ok(Self { pool })
    }
}

#[async_trait]
impl QuestionRepository for PgRepository {
    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        sqlx::query_as::<_, Category>("SELECT id, name, name_ru, slug FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::query_failed("list_categories", e))
    }

    async fn list_existing_questions(&self, category_id: i32) -> AppResult<Vec<QuestionRecord>> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT question, correct_answer, options, difficulty, score
            FROM quiz_questions
            WHERE category_id = $1
            "#,
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::query_failed("list_existing_questions", e))?;

        let total = rows.len();
        let records: Vec<QuestionRecord> =
            rows.into_iter().filter_map(QuestionRow::into_record).collect();
        if records.len() < total {
            warn!(
                "分类 {} 中有 {} 道题目的选项数量不是 4，已忽略",
                category_id,
                total - records.len()
            );
        }

        Ok(records)
    }

    async fn insert_question(&self, record: &QuestionRecord, category_id: i32) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO quiz_questions
                (category_id, question, correct_answer, options, difficulty, score)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(category_id)
        .bind(&record.question)
        .bind(&record.correct_answer)
        .bind(Json(&record.options))
        .bind(record.difficulty.as_str())
        .bind(i32::try_from(record.score).unwrap_or(i32::MAX))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::query_failed("insert_question", e))?;

        Ok(())
    }

    async fn record_user_score(
        &self,
        user_id: i64,
        category_id: i32,
        score: i32,
        correct_answers: i32,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_scores (user_id, category_id, score, correct_answers)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user_id)
        .bind(category_id)
        .bind(score)
        .bind(correct_answers)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::query_failed("record_user_score", e))?;

        debug!("已记录用户 {} 在分类 {} 的成绩: {}", user_id, category_id, score);
        Ok(())
    }

    async fn get_user_scores(&self, user_id: i64) -> AppResult<Vec<UserScore>> {
        sqlx::query_as::<_, UserScore>(
            r#"
            SELECT us.score, us.correct_answers, us.completed_at, c.name AS category_name
            FROM user_scores us
            JOIN categories c ON us.category_id = c.id
            WHERE us.user_id = $1
            ORDER BY us.completed_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::query_failed("get_user_scores", e))
    }

    async fn get_category_by_slug(&self, slug: &str) -> AppResult<Option<Category>> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, name_ru, slug FROM categories WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::query_failed("get_category_by_slug", e))
    }

    async fn seed_categories(&self, categories: &[NewCategory]) -> AppResult<usize> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::query_failed("seed_categories", e))?;

        let existing: HashSet<String> = sqlx::query_scalar::<_, String>("SELECT slug FROM categories")
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| AppError::query_failed("seed_categories", e))?
            .into_iter()
            .collect();

        let mut inserted = 0;
        for category in categories {
            if existing.contains(&category.slug) {
                info!("分类已存在: {}", category.name);
                continue;
            }

            sqlx::query("INSERT INTO categories (name, name_ru, slug) VALUES ($1, $2, $3)")
                .bind(&category.name)
                .bind(&category.name_ru)
                .bind(&category.slug)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::query_failed("seed_categories", e))?;

            info!("✓ 新增分类: {} ({})", category.name, category.name_ru);
            inserted += 1;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::query_failed("seed_categories", e))?;

        Ok(inserted)
    }
}
