//! 文本块解析 - 业务能力层
//!
//! 只负责把模型返回的一段原始文本拆成题目字段，不调用模型、不写数据库。
//!
//! ## 文本协议
//!
//! ```text
//! QUESTION: <题干>
//! ANSWER: <正确答案>
//! DIFFICULTY: <easy|medium|hard>
//! SCORE: <整数>
//! OPTIONS:
//! 1. <选项>
//! 2. <选项>
//! 3. <选项>
//! 4. <选项>
//! ===
//! ```
//!
//! 字段标签固定为英文，多个题目块之间以 `===` 分隔。
//! 解析采用宽松策略：单个块不合格只会被丢弃，不会让整批失败。

use regex::Regex;
use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::models::{Difficulty, DEFAULT_SCORE};
use crate::utils::logging::truncate_text;

/// 题目块分隔符
pub const BLOCK_SEPARATOR: &str = "===";

/// 每道题要求的选项数量
pub const OPTION_COUNT: usize = 4;

/// 字段标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Question,
    Answer,
    Difficulty,
    Score,
    Options,
}

impl Label {
    pub fn token(self) -> &'static str {
        match self {
            Label::Question => "QUESTION:",
            Label::Answer => "ANSWER:",
            Label::Difficulty => "DIFFICULTY:",
            Label::Score => "SCORE:",
            Label::Options => "OPTIONS:",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "QUESTION" => Some(Label::Question),
            "ANSWER" => Some(Label::Answer),
            "DIFFICULTY" => Some(Label::Difficulty),
            "SCORE" => Some(Label::Score),
            "OPTIONS" => Some(Label::Options),
            _ => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// 题目块被丢弃的原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockRejection {
    #[error("缺少字段 {0} 或内容为空")]
    MissingField(Label),
    #[error("选项数量为 {0}，需要 4 个")]
    OptionCount(usize),
    #[error("第 {0} 个选项清理后为空")]
    EmptyOption(usize),
    #[error("选项存在重复")]
    DuplicateOptions,
}

/// 从一个题目块中解析出的候选字段
///
/// `options[0]` 是模型给出的正确答案，位置尚未打乱。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFields {
    pub question: String,
    pub answer: String,
    pub difficulty: Difficulty,
    pub score: u32,
    pub options: [String; OPTION_COUNT],
}

/// 被丢弃的题目块
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedBlock {
    /// 块在响应中的序号（从0开始，只统计非空块）
    pub index: usize,
    pub reason: BlockRejection,
    /// 块内容预览（用于日志）
    pub preview: String,
}

/// 一次解析的结果
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub candidates: Vec<CandidateFields>,
    pub rejected: Vec<RejectedBlock>,
}

/// 单个块中扫描到的字段
///
/// 每个字段都显式区分"标签不存在"（None）和"标签存在"（Some）。
#[derive(Debug, Default)]
struct ScannedFields<'a> {
    question: Option<&'a str>,
    answer: Option<&'a str>,
    difficulty: Option<&'a str>,
    score: Option<&'a str>,
    options: Option<&'a str>,
}

impl<'a> ScannedFields<'a> {
    fn slot(&mut self, label: Label) -> &mut Option<&'a str> {
        match label {
            Label::Question => &mut self.question,
            Label::Answer => &mut self.answer,
            Label::Difficulty => &mut self.difficulty,
            Label::Score => &mut self.score,
            Label::Options => &mut self.options,
        }
    }
}

/// 文本块解析器
pub struct BlockParser {
    label_re: Regex,
    option_line_re: Regex,
    leak_marker_re: Regex,
    numbered_line_re: Regex,
    answer_note_re: Regex,
    label_prefix_re: Regex,
}

impl BlockParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            label_re: Regex::new(r"(?m)^[ \t]*(QUESTION|ANSWER|DIFFICULTY|SCORE|OPTIONS):")?,
            option_line_re: Regex::new(r"(?m)^[ \t]*\d+\.[ \t]+(.*?)[ \t]*$")?,
            leak_marker_re: Regex::new(
                r"(?i)(correct\s+answer|answer|правильный\s+ответ|ответ|options|варианты(\s+ответов?)?)\s*:",
            )?,
            numbered_line_re: Regex::new(r"(?m)^[ \t]*\d+[.)][ \t]")?,
            answer_note_re: Regex::new(
                r"(?i)\(\s*(correct\s+answer|answer|правильный\s+ответ|ответ)\s*:[^)]*\)",
            )?,
            label_prefix_re: Regex::new(
                r"(?i)^\s*(QUESTION|ANSWER|DIFFICULTY|SCORE|OPTIONS|correct\s+answer|правильный\s+ответ|ответ)\s*:\s*",
            )?,
        })
    }

    /// 解析模型的完整响应
    ///
    /// 空白块直接忽略；不合格的块记录到 `rejected`，永远不会返回错误。
    pub fn parse(&self, response: &str) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();

        let blocks = response
            .split(BLOCK_SEPARATOR)
            .filter(|block| !block.trim().is_empty());

        for (index, block) in blocks.enumerate() {
            match self.parse_block(block) {
                Ok(candidate) => outcome.candidates.push(candidate),
                Err(reason) => {
                    debug!("丢弃第 {} 个题目块: {}", index + 1, reason);
                    outcome.rejected.push(RejectedBlock {
                        index,
                        reason,
                        preview: truncate_text(block.trim(), 60),
                    });
                }
            }
        }

        outcome
    }

    /// 解析单个题目块
    pub fn parse_block(&self, block: &str) -> Result<CandidateFields, BlockRejection> {
        let fields = self.scan(block);

        let question = fields
            .question
            .map(|q| self.clean_question(q))
            .filter(|q| !q.is_empty())
            .ok_or(BlockRejection::MissingField(Label::Question))?;

        let answer = fields
            .answer
            .map(|a| self.clean_option(a))
            .filter(|a| !a.is_empty())
            .ok_or(BlockRejection::MissingField(Label::Answer))?;

        let options_text = fields
            .options
            .ok_or(BlockRejection::MissingField(Label::Options))?;
        let options = self.parse_options(options_text)?;

        if answer != options[0] {
            debug!(
                "ANSWER 与第一个选项不一致，以第一个选项为准: '{}' / '{}'",
                truncate_text(&answer, 40),
                truncate_text(&options[0], 40)
            );
        }

        Ok(CandidateFields {
            question,
            answer,
            difficulty: parse_difficulty(fields.difficulty),
            score: parse_score(fields.score),
            options,
        })
    }

    /// 按标签位置切分字段
    ///
    /// 标签只在行首生效，行内的 `ANSWER:` 等文本属于字段内容。
    /// 字段内容是该标签结束处到下一个标签开始处之间的文本，
    /// 同一标签出现多次时取第一个非空的内容。
    fn scan<'a>(&self, block: &'a str) -> ScannedFields<'a> {
        let matches: Vec<(Label, usize, usize)> = self
            .label_re
            .captures_iter(block)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let label = Label::from_name(caps.get(1)?.as_str())?;
                Some((label, whole.start(), whole.end()))
            })
            .collect();

        let mut fields = ScannedFields::default();
        for (i, &(label, _, value_start)) in matches.iter().enumerate() {
            let value_end = matches
                .get(i + 1)
                .map(|&(_, next_start, _)| next_start)
                .unwrap_or(block.len());
            let slot = fields.slot(label);
            if slot.map_or(true, str::is_empty) {
                *slot = Some(block[value_start..value_end].trim());
            }
        }
        fields
    }

    /// 清理题干中泄露的答案或选项
    fn clean_question(&self, raw: &str) -> String {
        let mut cut = raw.len();

        if let Some(m) = self.leak_marker_re.find(raw) {
            cut = cut.min(m.start());
        }

        // 第一行本身可能带编号，只检查后续行
        if let Some(first_newline) = raw.find('\n') {
            let rest = &raw[first_newline..];
            if let Some(m) = self.numbered_line_re.find(rest) {
                cut = cut.min(first_newline + m.start());
            }
        }

        raw[..cut].trim().to_string()
    }

    /// 清理选项或答案中的标注残留
    fn clean_option(&self, raw: &str) -> String {
        let without_notes = self.answer_note_re.replace_all(raw, "");
        let without_label = self.label_prefix_re.replace(without_notes.trim(), "");
        without_label.trim().to_string()
    }

    /// 解析编号选项，必须恰好 4 个且互不相同
    fn parse_options(&self, section: &str) -> Result<[String; OPTION_COUNT], BlockRejection> {
        let raw: Vec<&str> = self
            .option_line_re
            .captures_iter(section)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect();

        if raw.len() != OPTION_COUNT {
            return Err(BlockRejection::OptionCount(raw.len()));
        }

        let mut options: [String; OPTION_COUNT] = Default::default();
        for (i, text) in raw.iter().enumerate() {
            let cleaned = self.clean_option(text);
            if cleaned.is_empty() {
                return Err(BlockRejection::EmptyOption(i + 1));
            }
            if options[..i].contains(&cleaned) {
                return Err(BlockRejection::DuplicateOptions);
            }
            options[i] = cleaned;
        }

        Ok(options)
    }
}

/// 分值解析失败或为 0 时使用默认值
fn parse_score(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|&score| score > 0)
        .unwrap_or(DEFAULT_SCORE)
}

/// 难度缺失时按 medium 处理，其余取值只做小写化
fn parse_difficulty(raw: Option<&str>) -> Difficulty {
    match raw.map(str::trim) {
        Some(text) if !text.is_empty() => {
            let difficulty = Difficulty::parse(text);
            if !difficulty.is_known() {
                debug!("未知难度 {}，原样保留", difficulty);
            }
            difficulty
        }
        _ => Difficulty::Medium,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> BlockParser {
        BlockParser::new().unwrap()
    }

    fn block(question: &str, score: &str, options: [&str; 4]) -> String {
        format!(
            "QUESTION: {}\nANSWER: {}\nDIFFICULTY: Medium\nSCORE: {}\nOPTIONS:\n1. {}\n2. {}\n3. {}\n4. {}\n",
            question, options[0], score, options[0], options[1], options[2], options[3]
        )
    }

    #[test]
    fn test_parse_well_formed_block() {
        let text = block(
            "Какой интерфейс реализует ArrayList?",
            "10",
            ["List", "Map", "Queue", "Deque"],
        );

        let candidate = parser().parse_block(&text).unwrap();

        assert_eq!(candidate.question, "Какой интерфейс реализует ArrayList?");
        assert_eq!(candidate.answer, "List");
        assert_eq!(candidate.difficulty, Difficulty::Medium);
        assert_eq!(candidate.score, 10);
        assert_eq!(candidate.options, ["List", "Map", "Queue", "Deque"].map(String::from));
    }

    #[test]
    fn test_parse_multiple_blocks_skips_blank_segments() {
        let response = format!(
            "{}===\n{}===\n\n===   \n",
            block("Q1?", "5", ["a", "b", "c", "d"]),
            block("Q2?", "15", ["e", "f", "g", "h"]),
        );

        let outcome = parser().parse(&response);

        assert_eq!(outcome.candidates.len(), 2);
        assert!(outcome.rejected.is_empty());
        assert_eq!(outcome.candidates[1].question, "Q2?");
    }

    #[test]
    fn test_missing_options_section_rejected() {
        let text = "QUESTION: Что такое JVM?\nANSWER: Машина\nDIFFICULTY: easy\nSCORE: 5\n";

        let outcome = parser().parse(text);

        assert!(outcome.candidates.is_empty());
        assert_eq!(
            outcome.rejected[0].reason,
            BlockRejection::MissingField(Label::Options)
        );
    }

    #[test]
    fn test_wrong_option_count_rejected() {
        let three = "QUESTION: Q?\nANSWER: a\nDIFFICULTY: easy\nSCORE: 5\nOPTIONS:\n1. a\n2. b\n3. c\n";
        let five = "QUESTION: Q?\nANSWER: a\nDIFFICULTY: easy\nSCORE: 5\nOPTIONS:\n1. a\n2. b\n3. c\n4. d\n5. e\n";

        assert_eq!(
            parser().parse_block(three),
            Err(BlockRejection::OptionCount(3))
        );
        assert_eq!(
            parser().parse_block(five),
            Err(BlockRejection::OptionCount(5))
        );
    }

    #[test]
    fn test_score_defaults_to_five() {
        let text = block("Q?", "abc", ["a", "b", "c", "d"]);
        assert_eq!(parser().parse_block(&text).unwrap().score, 5);

        let zero = block("Q?", "0", ["a", "b", "c", "d"]);
        assert_eq!(parser().parse_block(&zero).unwrap().score, 5);
    }

    #[test]
    fn test_difficulty_lowercased_not_validated() {
        let text = "QUESTION: Q?\nANSWER: a\nDIFFICULTY: EXPERT\nSCORE: 5\nOPTIONS:\n1. a\n2. b\n3. c\n4. d\n";

        let candidate = parser().parse_block(text).unwrap();

        assert_eq!(candidate.difficulty, Difficulty::Other("expert".to_string()));
    }

    #[test]
    fn test_malformed_block_among_valid_ones() {
        let broken = "QUESTION: Без ответа?\nDIFFICULTY: easy\nSCORE: 5\nOPTIONS:\n1. a\n2. b\n3. c\n4. d\n";
        let response = [
            block("Q1?", "5", ["a", "b", "c", "d"]),
            broken.to_string(),
            block("Q2?", "5", ["a", "b", "c", "d"]),
            block("Q3?", "5", ["a", "b", "c", "d"]),
        ]
        .join("===\n");

        let outcome = parser().parse(&response);

        assert_eq!(outcome.candidates.len(), 3);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].index, 1);
        assert_eq!(
            outcome.rejected[0].reason,
            BlockRejection::MissingField(Label::Answer)
        );
    }

    #[test]
    fn test_question_leak_is_truncated() {
        let text = "QUESTION: Что выведет код?\nSystem.out.println(1);\n1. 1\n2. 0\nANSWER: 1\nDIFFICULTY: easy\nSCORE: 5\nOPTIONS:\n1. 1\n2. 0\n3. null\n4. Ошибка\n";

        let candidate = parser().parse_block(text).unwrap();

        assert_eq!(candidate.question, "Что выведет код?\nSystem.out.println(1);");
    }

    #[test]
    fn test_question_leaked_answer_marker() {
        let text = "QUESTION: Что такое HashMap? Правильный ответ: хеш-таблица\nANSWER: Хеш-таблица\nDIFFICULTY: easy\nSCORE: 5\nOPTIONS:\n1. Хеш-таблица\n2. Список\n3. Дерево\n4. Очередь\n";

        let candidate = parser().parse_block(text).unwrap();

        assert_eq!(candidate.question, "Что такое HashMap?");
    }

    #[test]
    fn test_numbered_question_first_line_kept() {
        let text = block("1. Что такое JDK?", "5", ["a", "b", "c", "d"]);

        let candidate = parser().parse_block(&text).unwrap();

        assert_eq!(candidate.question, "1. Что такое JDK?");
    }

    #[test]
    fn test_option_annotations_stripped() {
        let text = "QUESTION: Q?\nANSWER: ANSWER: final\nDIFFICULTY: easy\nSCORE: 5\nOPTIONS:\n1. final (Answer: correct)\n2. static\n3. Ответ: volatile\n4. transient\n";

        let candidate = parser().parse_block(text).unwrap();

        assert_eq!(candidate.answer, "final");
        assert_eq!(
            candidate.options,
            ["final", "static", "volatile", "transient"].map(String::from)
        );
    }

    #[test]
    fn test_duplicate_options_rejected() {
        let text = block("Q?", "5", ["a", "b", "a", "d"]);

        assert_eq!(
            parser().parse_block(&text),
            Err(BlockRejection::DuplicateOptions)
        );
    }

    #[test]
    fn test_out_of_order_labels() {
        let text = "SCORE: 15\nQUESTION: Q?\nOPTIONS:\n1. a\n2. b\n3. c\n4. d\nDIFFICULTY: hard\nANSWER: a\n";

        let candidate = parser().parse_block(text).unwrap();

        assert_eq!(candidate.question, "Q?");
        assert_eq!(candidate.answer, "a");
        assert_eq!(candidate.difficulty, Difficulty::Hard);
        assert_eq!(candidate.score, 15);
    }

    #[test]
    fn test_missing_difficulty_defaults_to_medium() {
        let text = "QUESTION: Q?\nANSWER: a\nSCORE: 5\nOPTIONS:\n1. a\n2. b\n3. c\n4. d\n";

        assert_eq!(
            parser().parse_block(text).unwrap().difficulty,
            Difficulty::Medium
        );
    }

    #[test]
    fn test_garbage_response() {
        let outcome = parser().parse("Извините, я не могу помочь с этим.");

        assert!(outcome.candidates.is_empty());
        assert_eq!(outcome.rejected.len(), 1);
        assert!(parser().parse("").candidates.is_empty());
    }

    #[test]
    fn test_inline_uppercase_answer_note_in_option() {
        let text = "QUESTION: Какой модификатор запрещает наследование?\nANSWER: final\nDIFFICULTY: easy\nSCORE: 5\nOPTIONS:\n1. final (ANSWER: correct)\n2. static\n3. volatile\n4. transient\n";

        let candidate = parser().parse_block(text).unwrap();

        assert_eq!(
            candidate.options,
            ["final", "static", "volatile", "transient"].map(String::from)
        );
    }

    #[test]
    fn test_labels_inside_code_do_not_split_fields() {
        let text = "QUESTION: Что выведет код?\nenum Field { QUESTION, SCORE }\nswitch (f) { case SCORE: return 1; }\nANSWER: 1\nDIFFICULTY: hard\nSCORE: 10\nOPTIONS:\n1. 1\n2. 0\n3. -1\n4. Ошибка компиляции\n";

        let candidate = parser().parse_block(text).unwrap();

        assert_eq!(
            candidate.question,
            "Что выведет код?\nenum Field { QUESTION, SCORE }\nswitch (f) { case SCORE: return 1; }"
        );
        assert_eq!(candidate.score, 10);
        assert_eq!(candidate.answer, "1");
    }
}
