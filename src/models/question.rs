use serde::{Deserialize, Serialize};
use std::fmt;

/// 题目分值解析失败时使用的默认值
pub const DEFAULT_SCORE: u32 = 5;

/// 题目难度
///
/// 模型输出的难度统一转为小写；无法识别的取值原样保留在 `Other` 中。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Other(String),
}

impl Difficulty {
    /// 从文本解析难度（大小写不敏感）
    pub fn parse(text: &str) -> Self {
        let normalized = text.trim().to_lowercase();
        match normalized.as_str() {
            "easy" => Difficulty::Easy,
            "medium" => Difficulty::Medium,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Other(s) => s,
        }
    }

    /// 是否属于 easy / medium / hard
    pub fn is_known(&self) -> bool {
        !matches!(self, Difficulty::Other(_))
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Difficulty {
    fn from(s: String) -> Self {
        Difficulty::parse(&s)
    }
}

impl From<Difficulty> for String {
    fn from(d: Difficulty) -> Self {
        d.as_str().to_string()
    }
}

/// 已校验的选择题
///
/// 只能由解析器 + 答案随机器生成，生成后不再修改。
/// `correct_answer` 在 `options` 中恰好出现一次。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question: String,
    pub correct_answer: String,
    pub options: [String; 4],
    pub difficulty: Difficulty,
    pub score: u32,
}

impl QuestionRecord {
    /// 正确答案在选项中的位置
    pub fn correct_index(&self) -> Option<usize> {
        self.options.iter().position(|o| o == &self.correct_answer)
    }

    /// 生成提示词里使用的去重行
    pub fn as_hint_line(&self) -> String {
        format!("- {} (Answer: {})", self.question, self.correct_answer)
    }
}

/// 用户成绩
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserScore {
    pub score: i32,
    pub correct_answers: i32,
    pub completed_at: chrono::DateTime<chrono::Utc>,
    pub category_name: String,
}
