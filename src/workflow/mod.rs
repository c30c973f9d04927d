pub mod question_generator;

pub use question_generator::{GenerationOutcome, QuestionGenerator, QuestionSource};
