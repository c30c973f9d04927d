//! 答案随机器 - 业务能力层
//!
//! 模型总是把正确答案写在第一个选项，这里把它放到随机位置。

use rand::seq::SliceRandom;
use rand::Rng;

use super::block_parser::OPTION_COUNT;

/// 打乱后的选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub options: [String; OPTION_COUNT],
    /// 与 `options` 中的某一项完全相同
    pub correct_answer: String,
}

impl Placement {
    pub fn correct_index(&self) -> usize {
        self.options
            .iter()
            .position(|o| o == &self.correct_answer)
            .unwrap_or_default()
    }
}

/// 使用线程随机数放置正确答案
pub fn place(options: [String; OPTION_COUNT]) -> Placement {
    place_with(options, &mut rand::thread_rng())
}

/// 使用指定随机数源放置正确答案
///
/// `options[0]` 为正确答案；其余三个错误选项先均匀打乱，
/// 再把正确答案插入到 0..4 中均匀抽取的位置。
pub fn place_with<R: Rng + ?Sized>(options: [String; OPTION_COUNT], rng: &mut R) -> Placement {
    let mut remaining: Vec<String> = options.into_iter().collect();
    let correct_answer = remaining.remove(0);

    remaining.shuffle(rng);
    let position = rng.gen_range(0..OPTION_COUNT);
    remaining.insert(position, correct_answer.clone());

    let mut final_options: [String; OPTION_COUNT] = Default::default();
    for (slot, option) in final_options.iter_mut().zip(remaining) {
        *slot = option;
    }

    Placement {
        options: final_options,
        correct_answer,
    }
}
