//! 提示词与模型调用接口
//!
//! `QuestionModel` 是生成流程与具体模型之间唯一的接缝：
//! 输入提示词变量，返回模型的原始文本。

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::QuestionRecord;

/// 一次模型调用所需的提示词变量
#[derive(Debug, Clone)]
pub struct PromptVariables<'a> {
    pub category_name: &'a str,
    pub category_name_ru: &'a str,
    /// 已有题目的去重提示
    pub existing_questions: &'a str,
    pub num_questions: usize,
}

/// 题目生成模型
#[async_trait]
pub trait QuestionModel: Send + Sync {
    /// 调用一次模型，返回未经处理的响应文本
    async fn invoke(&self, vars: &PromptVariables<'_>) -> AppResult<String>;
}

/// 已有题目格式化为去重提示，每行一题
pub fn format_existing_questions(existing: &[QuestionRecord]) -> String {
    existing
        .iter()
        .map(QuestionRecord::as_hint_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// 系统消息
pub const SYSTEM_MESSAGE: &str =
    "You are a Java programming expert and educator who writes multiple-choice quiz questions.";

/// 渲染用户提示词
pub fn render_prompt(vars: &PromptVariables<'_>) -> String {
    let existing = if vars.existing_questions.trim().is_empty() {
        "(none yet)"
    } else {
        vars.existing_questions
    };

    format!(
        r#"Your task is to generate questions about {name} ({name_ru}).
Based on these existing questions:

{existing}

Generate {count} new, unique, and educational questions about {name}. Focus on:
1. Core concepts and fundamentals
2. Best practices and common patterns
3. Common mistakes and pitfalls
4. Practical applications
5. Performance considerations
6. All content must be in Russian language

For each question, follow this exact format:
- The field labels "QUESTION:", "ANSWER:", "DIFFICULTY:", "SCORE:", "OPTIONS:" must remain in English
- Do not translate or modify these field labels
- DIFFICULTY: easy, medium, hard
- SCORE: easy=5, medium=10, hard=15
- The first option in OPTIONS must be exactly the same as the ANSWER

QUESTION: [your question in Russian]
ANSWER: [correct answer in Russian]
DIFFICULTY: [difficulty level]
SCORE: [score for the question]
OPTIONS:
1. [exact same text as ANSWER above]
2. [wrong option in Russian]
3. [wrong option in Russian]
4. [wrong option in Russian]
===

Make sure:
1. Questions are unique and not duplicates of existing ones
2. Wrong options are plausible but clearly incorrect
3. Each question is separated by "==="
4. Questions are technically accurate and reflect current Java practices
5. Code snippets are allowed, but keep comments and explanations in Russian
6. The correct answer (ANSWER) must be exactly the same as the first option in OPTIONS"#,
        name = vars.category_name,
        name_ru = vars.category_name_ru,
        existing = existing,
        count = vars.num_questions,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Difficulty;

    fn record(question: &str, answer: &str) -> QuestionRecord {
        QuestionRecord {
            question: question.to_string(),
            correct_answer: answer.to_string(),
            options: [answer, "b", "c", "d"].map(String::from),
            difficulty: Difficulty::Easy,
            score: 5,
        }
    }

    #[test]
    fn test_format_existing_questions() {
        let text = format_existing_questions(&[
            record("Что такое JVM?", "Виртуальная машина"),
            record("Что такое JIT?", "Компилятор"),
        ]);

        assert_eq!(
            text,
            "- Что такое JVM? (Answer: Виртуальная машина)\n- Что такое JIT? (Answer: Компилятор)"
        );
        assert_eq!(format_existing_questions(&[]), "");
    }

    #[test]
    fn test_render_prompt_contains_variables() {
        let prompt = render_prompt(&PromptVariables {
            category_name: "Collections Framework",
            category_name_ru: "Коллекции",
            existing_questions: "- Q (Answer: A)",
            num_questions: 15,
        });

        assert!(prompt.contains("Generate 15 new"));
        assert!(prompt.contains("Collections Framework (Коллекции)"));
        assert!(prompt.contains("- Q (Answer: A)"));
        assert!(prompt.contains("OPTIONS:\n1."));
    }
}
